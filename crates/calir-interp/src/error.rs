//! Failure modes an [`crate::Interpreter`] call can end with. Flat fields
//! rather than a shared context struct, the same shape `calir-verify` and
//! faxc-util's error enums use.

use std::fmt;
use thiserror::Error;

/// Which flavor of division produced a [`RuntimeError::DivisionByZero`].
///
/// Distinguished because signed, unsigned, and float division by zero are
/// each reported separately rather than collapsed into one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionKind {
    Signed,
    Unsigned,
    Float,
}

impl fmt::Display for DivisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DivisionKind::Signed => "signed",
            DivisionKind::Unsigned => "unsigned",
            DivisionKind::Float => "float",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("stack overflow: call's stack arena exceeded its {limit}-byte limit")]
    StackOverflow { limit: usize },

    /// Reported for signed, unsigned, and float division/remainder by zero.
    /// No opcode in the current instruction set performs division, so this
    /// variant is not reachable today; it documents the contract the
    /// runtime-value model commits to ahead of one.
    #[error("division by zero ({kind})")]
    DivisionByZero { kind: DivisionKind },

    #[error("invalid pointer: {reason}")]
    InvalidPointer { reason: String },

    #[error("call to @{name}: no function definition and no FFI binding registered for it")]
    UnboundExternal { name: String },

    #[error("function @{name}, block ${block}: no predecessor recorded for this block's phi instructions")]
    MissingPredecessor { name: String, block: String },

    #[error("function @{name}, block ${block}: phi has no incoming value for predecessor ${predecessor}")]
    PhiMissingIncoming { name: String, block: String, predecessor: String },

    #[error("{op} does not support operand type {ty}; only scalar and pointer types carry a runtime value")]
    UnsupportedType { op: &'static str, ty: String },

    #[error("allocating global storage failed: {reason}")]
    GlobalAllocFailed { reason: String },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
