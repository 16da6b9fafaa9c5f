//! Basic blocks.

use crate::function::Function;
use crate::instr::Instruction;
use crate::value::ValueBase;
use std::cell::{Cell, RefCell};

pub struct BasicBlock<'ctx> {
    pub base: ValueBase<'ctx>,
    pub parent: Cell<Option<&'ctx Function<'ctx>>>,
    instructions: RefCell<Vec<&'ctx Instruction<'ctx>>>,
}

impl<'ctx> BasicBlock<'ctx> {
    pub fn new(base: ValueBase<'ctx>) -> Self {
        BasicBlock { base, parent: Cell::new(None), instructions: RefCell::new(Vec::new()) }
    }

    pub fn instructions(&self) -> Vec<&'ctx Instruction<'ctx>> {
        self.instructions.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.instructions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.borrow().is_empty()
    }

    pub fn push(&self, instr: &'ctx Instruction<'ctx>, me: &'ctx BasicBlock<'ctx>) {
        instr.parent.set(Some(me));
        self.instructions.borrow_mut().push(instr);
    }

    pub fn terminator(&self) -> Option<&'ctx Instruction<'ctx>> {
        self.instructions.borrow().last().copied()
    }

    /// Index of `instr` within this block's instruction list, if present.
    pub fn position_of(&self, instr: &'ctx Instruction<'ctx>) -> Option<usize> {
        self.instructions.borrow().iter().position(|i| std::ptr::eq(*i, instr))
    }

    /// Remove `instr` from this block's instruction list. Does not unlink
    /// its operand or result `Use`s — that's the caller's job (see
    /// `Instruction::unlink_operands` and `replace_all_uses_with`).
    pub fn remove(&self, instr: &'ctx Instruction<'ctx>) {
        let mut instructions = self.instructions.borrow_mut();
        if let Some(pos) = instructions.iter().position(|i| std::ptr::eq(*i, instr)) {
            instructions.remove(pos);
        }
    }
}
