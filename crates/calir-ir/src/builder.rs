//! Programmatic IR construction: one method per opcode, an insertion
//! point, and an auto-naming counter for unnamed results.

use crate::block::BasicBlock;
use crate::context::Context;
use crate::error::{IrError, Result};
use crate::instr::{IcmpPredicate, InstrExtra, Instruction, Opcode};
use crate::types::{Ty, TypeKind};
use crate::value::{Use, ValueBase, ValueRef};
use std::cell::Cell;

/// Type-walk a `gep`'s index list, exactly as the verifier replays it:
/// the first index addresses the pointer itself and does not strip a
/// level of type; every index after that descends one level into an
/// array (any integer accepted) or a struct (a literal constant index,
/// checked against bounds).
pub fn gep_walk_type<'ctx>(source_type: Ty<'ctx>, indices: &[ValueRef<'ctx>]) -> Result<Ty<'ctx>> {
    let mut current = source_type;
    for index in indices.iter().skip(1) {
        current = match &current.kind {
            TypeKind::Array(elem, _) => *elem,
            TypeKind::Struct(body) => {
                let literal = index
                    .as_constant()
                    .and_then(|c| c.as_int())
                    .ok_or(IrError::GepIndexNotConstant)? as usize;
                *body.members.get(literal).ok_or(IrError::GepIndexOutOfBounds(literal))?
            }
            _ => return Err(IrError::GepNonAggregate),
        };
    }
    Ok(current)
}

pub struct Builder<'ctx> {
    ctx: &'ctx Context,
    insertion_block: Cell<Option<&'ctx BasicBlock<'ctx>>>,
    next_temp: Cell<u64>,
}

impl<'ctx> Builder<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Builder { ctx, insertion_block: Cell::new(None), next_temp: Cell::new(0) }
    }

    pub fn set_insertion_point(&self, block: &'ctx BasicBlock<'ctx>) {
        self.insertion_block.set(Some(block));
    }

    pub fn insertion_block(&self) -> Option<&'ctx BasicBlock<'ctx>> {
        self.insertion_block.get()
    }

    fn resolve_name(&self, name: Option<&str>) -> &'ctx str {
        match name {
            Some(n) => self.ctx.intern_str(n),
            None => {
                let n = self.next_temp.get();
                self.next_temp.set(n + 1);
                self.ctx.intern_str(&n.to_string())
            }
        }
    }

    fn add_operand(&self, instr: &'ctx Instruction<'ctx>, index: usize, value: ValueRef<'ctx>) -> Result<()> {
        let u = Use::create(self.ctx.ir_arena(), instr, index, value)?;
        instr.push_operand(u);
        Ok(())
    }

    fn insert(&self, instr: &'ctx Instruction<'ctx>) -> Result<&'ctx Instruction<'ctx>> {
        let block = self.insertion_block.get().ok_or(IrError::NoInsertionPoint)?;
        block.push(instr, block);
        Ok(instr)
    }

    pub fn create_add(&self, lhs: ValueRef<'ctx>, rhs: ValueRef<'ctx>, name: Option<&str>) -> Result<&'ctx Instruction<'ctx>> {
        self.binary(Opcode::Add, lhs, rhs, name)
    }

    pub fn create_sub(&self, lhs: ValueRef<'ctx>, rhs: ValueRef<'ctx>, name: Option<&str>) -> Result<&'ctx Instruction<'ctx>> {
        self.binary(Opcode::Sub, lhs, rhs, name)
    }

    fn binary(&self, opcode: Opcode, lhs: ValueRef<'ctx>, rhs: ValueRef<'ctx>, name: Option<&str>) -> Result<&'ctx Instruction<'ctx>> {
        let result_name = self.resolve_name(name);
        let base = ValueBase::new(lhs.ty(), Some(result_name));
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, opcode, InstrExtra::None))?;
        self.add_operand(instr, 0, lhs)?;
        self.add_operand(instr, 1, rhs)?;
        self.insert(instr)
    }

    pub fn create_icmp(
        &self,
        predicate: IcmpPredicate,
        lhs: ValueRef<'ctx>,
        rhs: ValueRef<'ctx>,
        name: Option<&str>,
    ) -> Result<&'ctx Instruction<'ctx>> {
        let result_name = self.resolve_name(name);
        let base = ValueBase::new(self.ctx.get_i1(), Some(result_name));
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Icmp, InstrExtra::Icmp(predicate)))?;
        self.add_operand(instr, 0, lhs)?;
        self.add_operand(instr, 1, rhs)?;
        self.insert(instr)
    }

    /// `alloca` is only valid in a function's entry block; the builder does
    /// not enforce that here (the verifier does) since some callers build
    /// blocks out of their eventual textual order.
    pub fn create_alloca(&self, allocated_type: Ty<'ctx>, name: Option<&str>) -> Result<&'ctx Instruction<'ctx>> {
        let result_name = self.resolve_name(name);
        let result_ty = self.ctx.get_ptr(allocated_type);
        let base = ValueBase::new(result_ty, Some(result_name));
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Alloca, InstrExtra::None))?;
        self.insert(instr)
    }

    pub fn create_load(&self, ptr: ValueRef<'ctx>, name: Option<&str>) -> Result<&'ctx Instruction<'ctx>> {
        let pointee = ptr.ty().pointee().ok_or(IrError::NotAPointer)?;
        let result_name = self.resolve_name(name);
        let base = ValueBase::new(pointee, Some(result_name));
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Load, InstrExtra::None))?;
        self.add_operand(instr, 0, ptr)?;
        self.insert(instr)
    }

    pub fn create_store(&self, value: ValueRef<'ctx>, ptr: ValueRef<'ctx>) -> Result<&'ctx Instruction<'ctx>> {
        if ptr.ty().pointee().is_none() {
            return Err(IrError::NotAPointer);
        }
        let base = ValueBase::new(self.ctx.get_void(), None);
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Store, InstrExtra::None))?;
        self.add_operand(instr, 0, value)?;
        self.add_operand(instr, 1, ptr)?;
        self.insert(instr)
    }

    /// Create an empty `phi` of declared type `ty`; incoming pairs are
    /// added afterward with [`Builder::phi_add_incoming`].
    pub fn create_phi(&self, ty: Ty<'ctx>, name: Option<&str>) -> Result<&'ctx Instruction<'ctx>> {
        let result_name = self.resolve_name(name);
        let base = ValueBase::new(ty, Some(result_name));
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Phi, InstrExtra::None))?;
        self.insert(instr)
    }

    pub fn phi_add_incoming(&self, phi: &'ctx Instruction<'ctx>, value: ValueRef<'ctx>, block: &'ctx BasicBlock<'ctx>) -> Result<()> {
        let index = phi.operand_count();
        self.add_operand(phi, index, value)?;
        self.add_operand(phi, index + 1, ValueRef::Block(block))?;
        Ok(())
    }

    pub fn create_gep(
        &self,
        source_type: Ty<'ctx>,
        base_ptr: ValueRef<'ctx>,
        indices: &[ValueRef<'ctx>],
        inbounds: bool,
        name: Option<&str>,
    ) -> Result<&'ctx Instruction<'ctx>> {
        let final_type = gep_walk_type(source_type, indices)?;
        let result_ty = self.ctx.get_ptr(final_type);
        let result_name = self.resolve_name(name);
        let base = ValueBase::new(result_ty, Some(result_name));
        let instr = self
            .ctx
            .ir_arena()
            .alloc(Instruction::new(base, Opcode::Gep, InstrExtra::Gep { source_type, inbounds }))?;
        self.add_operand(instr, 0, base_ptr)?;
        for (i, index) in indices.iter().enumerate() {
            self.add_operand(instr, i + 1, *index)?;
        }
        self.insert(instr)
    }

    pub fn create_call(&self, callee: ValueRef<'ctx>, args: &[ValueRef<'ctx>], name: Option<&str>) -> Result<&'ctx Instruction<'ctx>> {
        let function_type = callee.ty().pointee().and_then(|p| p.as_function()).ok_or(IrError::NotCallable)?;
        let result_name = self.resolve_name(name);
        let base = ValueBase::new(function_type.ret, Some(result_name));
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Call, InstrExtra::None))?;
        self.add_operand(instr, 0, callee)?;
        for (i, arg) in args.iter().enumerate() {
            self.add_operand(instr, i + 1, *arg)?;
        }
        self.insert(instr)
    }

    pub fn create_ret(&self, value: Option<ValueRef<'ctx>>) -> Result<&'ctx Instruction<'ctx>> {
        let base = ValueBase::new(self.ctx.get_void(), None);
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Ret, InstrExtra::None))?;
        if let Some(v) = value {
            self.add_operand(instr, 0, v)?;
        }
        self.insert(instr)
    }

    pub fn create_br(&self, target: &'ctx BasicBlock<'ctx>) -> Result<&'ctx Instruction<'ctx>> {
        let base = ValueBase::new(self.ctx.get_void(), None);
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::Br, InstrExtra::None))?;
        self.add_operand(instr, 0, ValueRef::Block(target))?;
        self.insert(instr)
    }

    pub fn create_cond_br(
        &self,
        cond: ValueRef<'ctx>,
        then_block: &'ctx BasicBlock<'ctx>,
        else_block: &'ctx BasicBlock<'ctx>,
    ) -> Result<&'ctx Instruction<'ctx>> {
        let base = ValueBase::new(self.ctx.get_void(), None);
        let instr = self.ctx.ir_arena().alloc(Instruction::new(base, Opcode::CondBr, InstrExtra::None))?;
        self.add_operand(instr, 0, cond)?;
        self.add_operand(instr, 1, ValueRef::Block(then_block))?;
        self.add_operand(instr, 2, ValueRef::Block(else_block))?;
        self.insert(instr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueRef;

    #[test]
    fn add_result_type_matches_operand_type() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let function = ctx.create_function("f").unwrap();
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let a = ValueRef::Constant(ctx.const_int(i32_ty, 1));
        let b = ValueRef::Constant(ctx.const_int(i32_ty, 2));
        let sum = builder.create_add(a, b, Some("sum")).unwrap();
        assert!(std::ptr::eq(sum.base.ty(), i32_ty));
        assert_eq!(sum.operand_count(), 2);
    }

    #[test]
    fn building_without_insertion_point_fails() {
        let ctx = Context::new();
        let builder = Builder::new(&ctx);
        let i32_ty = ctx.get_i32();
        let a = ValueRef::Constant(ctx.const_int(i32_ty, 1));
        let b = ValueRef::Constant(ctx.const_int(i32_ty, 2));
        assert!(matches!(builder.create_add(a, b, None), Err(IrError::NoInsertionPoint)));
    }

    #[test]
    fn gep_walks_struct_then_array() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let arr = ctx.get_array(i32_ty, 4);
        let st = ctx.get_anon_struct(&[i32_ty, arr]);
        let idx0 = ValueRef::Constant(ctx.const_int(i32_ty, 0));
        let idx1 = ValueRef::Constant(ctx.const_int(i32_ty, 1));
        let idx2 = ValueRef::Constant(ctx.const_int(i32_ty, 2));
        let result = gep_walk_type(st, &[idx0, idx1, idx2]).unwrap();
        assert!(std::ptr::eq(result, i32_ty));
    }
}
