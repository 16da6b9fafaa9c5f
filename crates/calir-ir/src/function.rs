//! Functions and arguments.

use crate::block::BasicBlock;
use crate::module::Module;
use crate::types::{FunctionSig, Ty};
use crate::value::ValueBase;
use std::cell::{Cell, RefCell};

pub struct Argument<'ctx> {
    pub base: ValueBase<'ctx>,
    pub index: usize,
}

/// Two lifecycle states: a *declaration* has a signature and a name but no
/// blocks and unnamed arguments; a *definition* has at least one block and
/// every argument is named.
pub struct Function<'ctx> {
    pub base: ValueBase<'ctx>,
    pub parent: Cell<Option<&'ctx Module<'ctx>>>,
    sig: Cell<Option<&'ctx FunctionSig<'ctx>>>,
    arguments: RefCell<Vec<&'ctx Argument<'ctx>>>,
    blocks: RefCell<Vec<&'ctx BasicBlock<'ctx>>>,
}

impl<'ctx> Function<'ctx> {
    pub fn new(base: ValueBase<'ctx>) -> Self {
        Function {
            base,
            parent: Cell::new(None),
            sig: Cell::new(None),
            arguments: RefCell::new(Vec::new()),
            blocks: RefCell::new(Vec::new()),
        }
    }

    pub fn signature(&self) -> Option<&'ctx FunctionSig<'ctx>> {
        self.sig.get()
    }

    pub fn finalize_signature(&self, sig: &'ctx FunctionSig<'ctx>, fn_ptr_ty: Ty<'ctx>) {
        self.sig.set(Some(sig));
        self.base.set_ty(fn_ptr_ty);
    }

    pub fn arguments(&self) -> Vec<&'ctx Argument<'ctx>> {
        self.arguments.borrow().clone()
    }

    pub fn push_argument(&self, arg: &'ctx Argument<'ctx>) {
        self.arguments.borrow_mut().push(arg);
    }

    pub fn blocks(&self) -> Vec<&'ctx BasicBlock<'ctx>> {
        self.blocks.borrow().clone()
    }

    pub fn push_block(&self, block: &'ctx BasicBlock<'ctx>) {
        self.blocks.borrow_mut().push(block);
    }

    pub fn entry_block(&self) -> Option<&'ctx BasicBlock<'ctx>> {
        self.blocks.borrow().first().copied()
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.borrow().is_empty()
    }

    pub fn is_definition(&self) -> bool {
        !self.is_declaration()
    }

    pub fn return_type(&self) -> Option<Ty<'ctx>> {
        self.sig.get().map(|s| s.ret)
    }
}
