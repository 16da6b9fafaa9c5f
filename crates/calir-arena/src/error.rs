//! Error types for arena allocation failures.

use thiserror::Error;

/// Failure modes for [`crate::Arena`] operations.
///
/// The arena itself never panics on exhaustion; callers get a typed error
/// back and decide whether that is fatal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// The allocation would exceed the arena's configured byte limit.
    #[error("arena allocation of {requested} bytes would exceed the {limit}-byte limit")]
    LimitExceeded { requested: usize, limit: usize },

    /// The host allocator itself refused to hand back a new chunk.
    #[error("out of memory while growing arena by {requested} bytes")]
    OutOfMemory { requested: usize },
}

pub type Result<T> = std::result::Result<T, ArenaError>;
