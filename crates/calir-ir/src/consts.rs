//! Constants: uniqued leaf values that never belong to a block.
//!
//! Like types, constants are canonicalized — `Context::const_int(i32_ty, 42)`
//! called twice returns the same pointer both times — so constant equality
//! is pointer equality, same as [`crate::types::ty_eq`].

use crate::value::ValueBase;

pub struct ConstantData<'ctx> {
    pub base: ValueBase<'ctx>,
    pub kind: ConstantKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstantKind {
    Int(u64),
    Float(f64),
    /// `undef` for this constant's type. Carries no payload; its type
    /// alone (via `base.ty`) distinguishes one undef from another.
    Undef,
    /// All-zero initializer for an aggregate or pointer type.
    ZeroInitializer,
}

impl<'ctx> ConstantData<'ctx> {
    pub fn as_int(&self) -> Option<u64> {
        match self.kind {
            ConstantKind::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.kind {
            ConstantKind::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self.kind, ConstantKind::Undef)
    }
}
