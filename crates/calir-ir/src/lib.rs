//! Calir's in-memory SSA IR: interned types and constants, the def-use
//! graph, the builder, and the canonical printer.

pub mod block;
pub mod builder;
pub mod consts;
pub mod context;
pub mod error;
pub mod function;
pub mod instr;
pub mod layout;
pub mod module;
pub mod printer;
pub mod types;
pub mod value;

pub use block::BasicBlock;
pub use consts::{ConstantData, ConstantKind};
pub use context::Context;
pub use error::{IrError, Result};
pub use function::{Argument, Function};
pub use instr::{IcmpPredicate, InstrExtra, Instruction, Opcode};
pub use layout::DataLayout;
pub use module::{GlobalVariable, Module};
pub use types::{FunctionSig, StructBody, Ty, TypeData, TypeKind};
pub use value::{ValueBase, ValueKindTag, ValueRef};
