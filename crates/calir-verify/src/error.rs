//! Diagnostic type the verifier reports through. Each variant carries its
//! own location fields directly, the same flat shape faxc-util's error
//! enums use rather than a shared context wrapper.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VerifyError {
    #[error("global @{name}: declared type {declared} does not match ptr(allocated_type) {expected}")]
    GlobalTypeMismatch { name: String, declared: String, expected: String },

    #[error("global @{name}: initializer has type {found}, expected {expected}")]
    GlobalInitializerTypeMismatch { name: String, expected: String, found: String },

    #[error("function @{name}: declaration has a body block; declarations must have none")]
    DeclarationHasBlocks { name: String },

    #[error("function @{name}: declaration argument {index} carries a name; declaration arguments must be unnamed")]
    DeclarationArgumentNamed { name: String, index: usize },

    #[error("function @{name}: definition has no blocks; a definition needs at least one")]
    DefinitionMissingBlocks { name: String },

    #[error("function @{name}: definition argument {index} is unnamed; definition arguments must be named")]
    DefinitionArgumentUnnamed { name: String, index: usize },

    #[error("function @{name}: definition argument {index} has void type")]
    DefinitionArgumentVoid { name: String, index: usize },

    #[error("function @{name}: signature was never finalized")]
    SignatureNotFinalized { name: String },

    #[error("function @{name}, block ${block}: block is empty")]
    EmptyBlock { name: String, block: String },

    #[error("function @{name}, block ${block}: last instruction '{instr}' is not a terminator")]
    MissingTerminator { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}: instruction '{instr}' is a terminator but is not the block's last instruction")]
    InteriorTerminator { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}: phi '{instr}' follows a non-phi instruction; phis must be contiguous at the block head")]
    PhiNotAtHead { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `ret` in a void function takes 0 operands, found {found}")]
    RetArityInVoidFn { name: String, block: String, instr: String, found: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': `ret` takes exactly 1 operand, found {found}")]
    RetArity { name: String, block: String, instr: String, found: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': `ret` operand has type {found}, expected return type {expected}")]
    RetTypeMismatch { name: String, block: String, instr: String, expected: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `br` takes exactly 1 label operand, found {found}")]
    BrArity { name: String, block: String, instr: String, found: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': `cond_br` takes (i1, label, label), found {found} operands")]
    CondBrArity { name: String, block: String, instr: String, found: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': `cond_br` condition has type {found}, expected i1")]
    CondBrConditionNotI1 { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `cond_br` target {which} is not a block")]
    CondBrTargetNotBlock { name: String, block: String, instr: String, which: &'static str },

    #[error("function @{name}, block ${block}, instruction '{instr}': `{opcode}` takes 2 operands, found {found}")]
    BinaryArity { name: String, block: String, instr: String, opcode: &'static str, found: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': `{opcode}` operands must share one integer-or-float type, found {lhs} and {rhs}")]
    BinaryOperandTypeMismatch { name: String, block: String, instr: String, opcode: &'static str, lhs: String, rhs: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `{opcode}` result type {found} does not match operand type {expected}")]
    BinaryResultTypeMismatch { name: String, block: String, instr: String, opcode: &'static str, expected: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `icmp` operands must share one integer-or-pointer type, found {lhs} and {rhs}")]
    IcmpOperandTypeMismatch { name: String, block: String, instr: String, lhs: String, rhs: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `icmp` result type must be i1, found {found}")]
    IcmpResultNotI1 { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `alloca` outside the entry block")]
    AllocaOutsideEntry { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `alloca` result type {found} is not ptr(allocated_type)")]
    AllocaResultTypeMismatch { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `load` operand has type {found}, expected a pointer")]
    LoadOperandNotPointer { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `load` result type {found} does not match pointee type {expected}")]
    LoadResultTypeMismatch { name: String, block: String, instr: String, expected: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `store` pointer operand has type {found}, expected a pointer")]
    StoreOperandNotPointer { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `store` value has type {value}, expected pointee type {pointee}")]
    StoreTypeMismatch { name: String, block: String, instr: String, value: String, pointee: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `phi` has an odd number of operands")]
    PhiOddOperands { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `phi` incoming value has type {found}, expected result type {expected}")]
    PhiIncomingTypeMismatch { name: String, block: String, instr: String, expected: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `phi` incoming pair's second element is not a block")]
    PhiIncomingNotBlock { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `gep` has no base pointer operand")]
    GepMissingBase { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `gep` base operand has type {found}, expected a pointer")]
    GepBaseNotPointer { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `gep` index must be a constant integer when indexing a struct")]
    GepIndexNotConstant { name: String, block: String, instr: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `gep` index {index} is out of bounds for this struct type")]
    GepIndexOutOfBounds { name: String, block: String, instr: String, index: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': `gep` attempted to index into non-aggregate type {found}")]
    GepNonAggregate { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `gep` result type {found} does not match computed type {expected}")]
    GepResultTypeMismatch { name: String, block: String, instr: String, expected: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `call` callee has type {found}, expected a pointer to a function")]
    CallNotCallable { name: String, block: String, instr: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `call` passes {found} arguments, callee expects {expected}")]
    CallArityMismatch { name: String, block: String, instr: String, expected: String, found: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': `call` argument {index} has type {found}, expected {expected}")]
    CallArgTypeMismatch { name: String, block: String, instr: String, index: usize, expected: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': `call` result type {found} does not match callee return type {expected}")]
    CallResultTypeMismatch { name: String, block: String, instr: String, expected: String, found: String },

    #[error("function @{name}, block ${block}, instruction '{instr}': operand {index}'s use is missing from its value's uses list")]
    UseNotRecorded { name: String, block: String, instr: String, index: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': operand {index}'s use back-pointer names a different user")]
    UseUserMismatch { name: String, block: String, instr: String, index: usize },

    #[error("function @{name}, block ${block}, instruction '{instr}': operand {index} uses '{def}', defined later in the same block")]
    UseBeforeDef { name: String, block: String, instr: String, index: usize, def: String },
}

pub type Result<T> = std::result::Result<T, VerifyError>;
