//! Errors raised while building or mutating IR. Parse/verify/runtime errors
//! live in their own crates; this is just the allocator-failure and
//! builder-misuse surface of `calir-ir` itself.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum IrError {
    #[error("allocation failed: {0}")]
    Alloc(#[from] calir_arena::ArenaError),

    #[error("builder has no insertion block set")]
    NoInsertionPoint,

    #[error("function type already finalized for @{name}")]
    SignatureAlreadyFinalized { name: String },

    #[error("phi instruction requires an even number of value/label pairs")]
    OddPhiOperands,

    #[error("expected a pointer type for this operand")]
    NotAPointer,

    #[error("gep index must be a constant integer when indexing a struct")]
    GepIndexNotConstant,

    #[error("gep index {0} is out of bounds for this struct type")]
    GepIndexOutOfBounds(usize),

    #[error("gep attempted to index into a non-aggregate type")]
    GepNonAggregate,

    #[error("call target's type is not a pointer to a function")]
    NotCallable,
}

pub type Result<T> = std::result::Result<T, IrError>;
