//! Crate-wide error types for `calir-util` itself (index/span bookkeeping
//! mistakes). Most failures that matter to end users surface from
//! `calir-text`/`calir-verify`/`calir-interp` instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UtilError {
    #[error("index {index} out of bounds (length {length})")]
    IndexOutOfBounds { index: usize, length: usize },
}

pub type Result<T> = std::result::Result<T, UtilError>;
