//! The def-use graph: [`ValueRef`], [`Use`], and
//! [`replace_all_uses_with`] — the single primitive every graph mutation
//! (instruction erasure, constant folding) is built from.
//!
//! A `Use` lives in two places at once: the instruction that owns it treats
//! it as one entry of its ordered operand list, while the value it names
//! treats it as one (unordered) entry of its uses list. Both lists are kept
//! as plain `Vec`s behind a `RefCell` rather than as an intrusive linked
//! list of raw pointers — asking the reader to trust pointer-chasing
//! invariants across arena resets is exactly the kind of thing you don't
//! want to do without a compiler to check your work.

use crate::consts::ConstantData;
use crate::function::{Argument, Function};
use crate::instr::Instruction;
use crate::module::GlobalVariable;
use crate::types::Ty;
use std::cell::{Cell, RefCell};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKindTag {
    Argument,
    Instruction,
    Block,
    Function,
    Constant,
    Global,
}

/// Fields every IR-addressable thing shares: its type, an optional name,
/// and the list of [`Use`]s naming it.
pub struct ValueBase<'ctx> {
    ty: Cell<Ty<'ctx>>,
    name: Cell<Option<&'ctx str>>,
    uses: RefCell<Vec<&'ctx Use<'ctx>>>,
}

impl<'ctx> ValueBase<'ctx> {
    pub fn new(ty: Ty<'ctx>, name: Option<&'ctx str>) -> Self {
        ValueBase { ty: Cell::new(ty), name: Cell::new(name), uses: RefCell::new(Vec::new()) }
    }

    pub fn ty(&self) -> Ty<'ctx> {
        self.ty.get()
    }

    /// Install `ty` as this value's type. The only legitimate caller is
    /// `Function::finalize_signature`, which installs the canonical
    /// `ptr(function_type)` once the signature is known; every other kind
    /// of value's type is fixed for good at construction.
    pub fn set_ty(&self, ty: Ty<'ctx>) {
        self.ty.set(ty);
    }

    pub fn name(&self) -> Option<&'ctx str> {
        self.name.get()
    }

    pub fn set_name(&self, name: Option<&'ctx str>) {
        self.name.set(name);
    }

    pub fn uses_len(&self) -> usize {
        self.uses.borrow().len()
    }

    pub fn uses(&self) -> Vec<&'ctx Use<'ctx>> {
        self.uses.borrow().clone()
    }

    pub fn has_uses(&self) -> bool {
        !self.uses.borrow().is_empty()
    }

    /// Drop every recorded use without unlinking it from its user's
    /// operand list. Only `Context::reset_ir` calls this, for constants
    /// (the one kind of value that outlives the IR arena its users lived
    /// in — once that arena is reset, those users no longer exist either).
    pub fn clear_uses(&self) {
        self.uses.borrow_mut().clear();
    }
}

/// A reference to anything a [`Use`] can point at. Equality is by the
/// address of the underlying [`ValueBase`], never structural.
#[derive(Clone, Copy)]
pub enum ValueRef<'ctx> {
    Argument(&'ctx Argument<'ctx>),
    Instruction(&'ctx Instruction<'ctx>),
    Block(&'ctx crate::block::BasicBlock<'ctx>),
    Function(&'ctx Function<'ctx>),
    Constant(&'ctx ConstantData<'ctx>),
    Global(&'ctx GlobalVariable<'ctx>),
}

impl<'ctx> ValueRef<'ctx> {
    pub fn kind(self) -> ValueKindTag {
        match self {
            ValueRef::Argument(_) => ValueKindTag::Argument,
            ValueRef::Instruction(_) => ValueKindTag::Instruction,
            ValueRef::Block(_) => ValueKindTag::Block,
            ValueRef::Function(_) => ValueKindTag::Function,
            ValueRef::Constant(_) => ValueKindTag::Constant,
            ValueRef::Global(_) => ValueKindTag::Global,
        }
    }

    pub fn base(self) -> &'ctx ValueBase<'ctx> {
        match self {
            ValueRef::Argument(a) => &a.base,
            ValueRef::Instruction(i) => &i.base,
            ValueRef::Block(b) => &b.base,
            ValueRef::Function(f) => &f.base,
            ValueRef::Constant(c) => &c.base,
            ValueRef::Global(g) => &g.base,
        }
    }

    pub fn ty(self) -> Ty<'ctx> {
        self.base().ty()
    }

    pub fn name(self) -> Option<&'ctx str> {
        self.base().name()
    }

    pub fn as_instruction(self) -> Option<&'ctx Instruction<'ctx>> {
        match self {
            ValueRef::Instruction(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_block(self) -> Option<&'ctx crate::block::BasicBlock<'ctx>> {
        match self {
            ValueRef::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_constant(self) -> Option<&'ctx ConstantData<'ctx>> {
        match self {
            ValueRef::Constant(c) => Some(c),
            _ => None,
        }
    }
}

impl<'ctx> PartialEq for ValueRef<'ctx> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.base() as *const ValueBase<'ctx>, other.base() as *const ValueBase<'ctx>)
    }
}
impl<'ctx> Eq for ValueRef<'ctx> {}

/// A directed edge from a user instruction to the value it consumes.
pub struct Use<'ctx> {
    value: Cell<ValueRef<'ctx>>,
    user: &'ctx Instruction<'ctx>,
    operand_index: usize,
    /// Cached index of this `Use` within `value`'s uses list, kept in sync
    /// by [`unlink`]/[`Use::retarget`] so removal is O(1) amortized
    /// (`Vec::swap_remove` plus a single slot fixup) rather than a scan.
    slot: Cell<usize>,
}

impl<'ctx> Use<'ctx> {
    pub fn value(&self) -> ValueRef<'ctx> {
        self.value.get()
    }

    pub fn user(&self) -> &'ctx Instruction<'ctx> {
        self.user
    }

    pub fn operand_index(&self) -> usize {
        self.operand_index
    }

    /// Allocate a new `Use` from `user`'s operand `operand_index` to
    /// `value`, linking it into `value`'s uses list.
    pub fn create(
        arena: &'ctx calir_arena::Arena,
        user: &'ctx Instruction<'ctx>,
        operand_index: usize,
        value: ValueRef<'ctx>,
    ) -> crate::error::Result<&'ctx Use<'ctx>> {
        let allocated = arena.alloc(Use {
            value: Cell::new(value),
            user,
            operand_index,
            slot: Cell::new(0),
        })?;
        let u: &'ctx Use<'ctx> = &*allocated;
        let mut uses = value.base().uses.borrow_mut();
        uses.push(u);
        u.slot.set(uses.len() - 1);
        drop(uses);
        Ok(u)
    }
}

fn unlink_from_current<'ctx>(u: &'ctx Use<'ctx>) {
    let value = u.value.get();
    let mut uses = value.base().uses.borrow_mut();
    let idx = u.slot.get();
    debug_assert!(std::ptr::eq(uses[idx], u));
    uses.swap_remove(idx);
    if idx < uses.len() {
        uses[idx].slot.set(idx);
    }
}

/// Remove `u` from its current value's uses list. Used when erasing an
/// instruction's operands.
pub fn unlink<'ctx>(u: &'ctx Use<'ctx>) {
    unlink_from_current(u);
}

/// Move `u` from its current value's uses list to `new_value`'s.
pub fn retarget<'ctx>(u: &'ctx Use<'ctx>, new_value: ValueRef<'ctx>) {
    unlink_from_current(u);
    u.value.set(new_value);
    let mut uses = new_value.base().uses.borrow_mut();
    uses.push(u);
    u.slot.set(uses.len() - 1);
}

/// Retarget every use of `old` to `new` in a single pass. On return,
/// `old`'s uses list is empty and every former edge appears in `new`'s.
///
/// A no-op when `old` and `new` are the same value, so that
/// `replace_all_uses_with(x, x)` leaves `x`'s uses list untouched rather
/// than merely re-ordered.
pub fn replace_all_uses_with<'ctx>(old: ValueRef<'ctx>, new: ValueRef<'ctx>) {
    if old == new {
        return;
    }
    loop {
        let next = old.base().uses.borrow().last().copied();
        match next {
            Some(u) => retarget(u, new),
            None => break,
        }
    }
}
