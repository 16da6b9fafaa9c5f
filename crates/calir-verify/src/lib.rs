//! Structural verifier: walks module → functions → blocks → instructions,
//! checking the invariants `calir-text`'s parser and `calir-ir`'s builder
//! don't enforce themselves. Stops at the first failure it finds, the same
//! "one diagnostic per run" contract a boolean verifier would have — the
//! richer [`VerifyError`] is carried for a readable message, not to
//! accumulate a full error list.

pub mod error;

pub use error::VerifyError;

use calir_ir::block::BasicBlock;
use calir_ir::function::Function;
use calir_ir::instr::{Instruction, Opcode};
use calir_ir::module::Module;
use calir_ir::printer::type_to_string;
use calir_ir::types::{ty_eq, TypeKind};
use calir_ir::value::ValueRef;
use calir_ir::IrError;

/// Verify every global, function, block, and instruction in `module`.
///
/// Returns `Ok(())` if the module is structurally valid, or a one-element
/// `Vec<VerifyError>` naming the first violation found. The `Vec` return
/// type exists so a future version that accumulates multiple diagnostics
/// per run is a compatible extension, not a breaking one.
pub fn verify(module: &Module<'_>) -> Result<(), Vec<VerifyError>> {
    log::debug!("verifying module \"{}\"", module.name);
    match verify_module(module) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::warn!("verification failed: {e}");
            Err(vec![e])
        }
    }
}

fn verify_module(module: &Module<'_>) -> Result<(), VerifyError> {
    for global in module.globals() {
        let name = global.base.name().unwrap_or("").to_string();
        match global.base.ty().pointee() {
            Some(p) if ty_eq(p, global.allocated_type) => {}
            _ => {
                return Err(VerifyError::GlobalTypeMismatch {
                    name,
                    declared: type_to_string(global.base.ty()),
                    expected: format!("<{}>", type_to_string(global.allocated_type)),
                })
            }
        }
        if let Some(init) = global.initializer {
            if !ty_eq(init.ty(), global.allocated_type) {
                return Err(VerifyError::GlobalInitializerTypeMismatch {
                    name,
                    expected: type_to_string(global.allocated_type),
                    found: type_to_string(init.ty()),
                });
            }
        }
    }

    for function in module.functions() {
        verify_function(function)?;
    }
    Ok(())
}

fn verify_function(function: &Function<'_>) -> Result<(), VerifyError> {
    let name = function.base.name().unwrap_or("").to_string();
    log::trace!("verifying function @{name}");

    if function.signature().is_none() {
        return Err(VerifyError::SignatureNotFinalized { name });
    }

    if function.is_declaration() {
        for (index, arg) in function.arguments().iter().enumerate() {
            if arg.base.name().is_some() {
                return Err(VerifyError::DeclarationArgumentNamed { name, index });
            }
        }
        return Ok(());
    }

    for (index, arg) in function.arguments().iter().enumerate() {
        if arg.base.name().is_none() {
            return Err(VerifyError::DefinitionArgumentUnnamed { name, index });
        }
        if matches!(arg.base.ty().kind, TypeKind::Void) {
            return Err(VerifyError::DefinitionArgumentVoid { name, index });
        }
    }

    let entry = function.entry_block();
    for block in function.blocks() {
        verify_block(function, &name, block, entry)?;
    }
    Ok(())
}

fn verify_block<'a>(
    function: &Function<'_>,
    fn_name: &str,
    block: &BasicBlock<'a>,
    entry: Option<&BasicBlock<'a>>,
) -> Result<(), VerifyError> {
    let block_name = block.base.name().unwrap_or("").to_string();
    let instructions = block.instructions();

    if instructions.is_empty() {
        return Err(VerifyError::EmptyBlock { name: fn_name.to_string(), block: block_name });
    }

    let last_index = instructions.len() - 1;
    let mut seen_non_phi = false;
    for (i, instr) in instructions.iter().enumerate() {
        let is_terminator = instr.opcode.is_terminator();
        if i == last_index {
            if !is_terminator {
                return Err(VerifyError::MissingTerminator {
                    name: fn_name.to_string(),
                    block: block_name,
                    instr: instr_label(instr),
                });
            }
        } else if is_terminator {
            return Err(VerifyError::InteriorTerminator {
                name: fn_name.to_string(),
                block: block_name,
                instr: instr_label(instr),
            });
        }

        if instr.opcode == Opcode::Phi {
            if seen_non_phi {
                return Err(VerifyError::PhiNotAtHead {
                    name: fn_name.to_string(),
                    block: block_name,
                    instr: instr_label(instr),
                });
            }
        } else {
            seen_non_phi = true;
        }

        verify_instruction(function, fn_name, &block_name, block, instr, entry)?;
    }
    Ok(())
}

fn instr_label(instr: &Instruction<'_>) -> String {
    instr.base.name().map(|s| s.to_string()).unwrap_or_else(|| instr.opcode.mnemonic().to_string())
}

fn verify_instruction<'a>(
    function: &Function<'_>,
    fn_name: &str,
    block_name: &str,
    block: &BasicBlock<'a>,
    instr: &'a Instruction<'a>,
    entry: Option<&BasicBlock<'a>>,
) -> Result<(), VerifyError> {
    let name = fn_name.to_string();
    let blk = block_name.to_string();
    let label = instr_label(instr);
    let operands = instr.operands();
    let operand_values: Vec<ValueRef<'_>> = operands.iter().map(|u| u.value()).collect();

    match instr.opcode {
        Opcode::Ret => {
            let ret_ty = function.signature().expect("checked in verify_function").ret;
            if matches!(ret_ty.kind, TypeKind::Void) {
                if !operand_values.is_empty() {
                    return Err(VerifyError::RetArityInVoidFn { name, block: blk, instr: label, found: operand_values.len() });
                }
            } else {
                if operand_values.len() != 1 {
                    return Err(VerifyError::RetArity { name, block: blk, instr: label, found: operand_values.len() });
                }
                if !ty_eq(operand_values[0].ty(), ret_ty) {
                    return Err(VerifyError::RetTypeMismatch {
                        name,
                        block: blk,
                        instr: label,
                        expected: type_to_string(ret_ty),
                        found: type_to_string(operand_values[0].ty()),
                    });
                }
            }
        }

        Opcode::Br => {
            if operand_values.len() != 1 || operand_values[0].as_block().is_none() {
                return Err(VerifyError::BrArity { name, block: blk, instr: label, found: operand_values.len() });
            }
        }

        Opcode::CondBr => {
            if operand_values.len() != 3 {
                return Err(VerifyError::CondBrArity { name, block: blk, instr: label, found: operand_values.len() });
            }
            let cond_ty = operand_values[0].ty();
            if cond_ty.int_width() != Some(1) {
                return Err(VerifyError::CondBrConditionNotI1 {
                    name,
                    block: blk,
                    instr: label,
                    found: type_to_string(cond_ty),
                });
            }
            if operand_values[1].as_block().is_none() {
                return Err(VerifyError::CondBrTargetNotBlock { name, block: blk, instr: label, which: "then" });
            }
            if operand_values[2].as_block().is_none() {
                return Err(VerifyError::CondBrTargetNotBlock { name, block: blk, instr: label, which: "else" });
            }
        }

        Opcode::Add | Opcode::Sub => {
            let opcode = instr.opcode.mnemonic();
            if operand_values.len() != 2 {
                return Err(VerifyError::BinaryArity { name, block: blk, instr: label, opcode, found: operand_values.len() });
            }
            let (lhs, rhs) = (operand_values[0].ty(), operand_values[1].ty());
            if !ty_eq(lhs, rhs) || !(lhs.is_integer() || lhs.is_float()) {
                return Err(VerifyError::BinaryOperandTypeMismatch {
                    name,
                    block: blk,
                    instr: label,
                    opcode,
                    lhs: type_to_string(lhs),
                    rhs: type_to_string(rhs),
                });
            }
            if !ty_eq(instr.base.ty(), lhs) {
                return Err(VerifyError::BinaryResultTypeMismatch {
                    name,
                    block: blk,
                    instr: label,
                    opcode,
                    expected: type_to_string(lhs),
                    found: type_to_string(instr.base.ty()),
                });
            }
        }

        Opcode::Icmp => {
            if operand_values.len() != 2 {
                return Err(VerifyError::BinaryArity {
                    name,
                    block: blk,
                    instr: label,
                    opcode: "icmp",
                    found: operand_values.len(),
                });
            }
            let (lhs, rhs) = (operand_values[0].ty(), operand_values[1].ty());
            if !ty_eq(lhs, rhs) || !(lhs.is_integer() || lhs.is_pointer()) {
                return Err(VerifyError::IcmpOperandTypeMismatch {
                    name,
                    block: blk,
                    instr: label,
                    lhs: type_to_string(lhs),
                    rhs: type_to_string(rhs),
                });
            }
            if instr.base.ty().int_width() != Some(1) {
                return Err(VerifyError::IcmpResultNotI1 { name, block: blk, instr: label, found: type_to_string(instr.base.ty()) });
            }
        }

        Opcode::Alloca => {
            if instr.base.ty().pointee().is_none() {
                return Err(VerifyError::AllocaResultTypeMismatch {
                    name,
                    block: blk,
                    instr: label,
                    found: type_to_string(instr.base.ty()),
                });
            }
            let is_entry = entry.is_some_and(|e| std::ptr::eq(e, block));
            if !is_entry {
                return Err(VerifyError::AllocaOutsideEntry { name, block: blk, instr: label });
            }
        }

        Opcode::Load => {
            if operand_values.is_empty() {
                return Err(VerifyError::LoadOperandNotPointer { name, block: blk, instr: label, found: "<missing>".into() });
            }
            let ptr_ty = operand_values[0].ty();
            match ptr_ty.pointee() {
                None => {
                    return Err(VerifyError::LoadOperandNotPointer { name, block: blk, instr: label, found: type_to_string(ptr_ty) })
                }
                Some(pointee) if !ty_eq(instr.base.ty(), pointee) => {
                    return Err(VerifyError::LoadResultTypeMismatch {
                        name,
                        block: blk,
                        instr: label,
                        expected: type_to_string(pointee),
                        found: type_to_string(instr.base.ty()),
                    })
                }
                Some(_) => {}
            }
        }

        Opcode::Store => {
            if operand_values.len() != 2 {
                return Err(VerifyError::StoreOperandNotPointer { name, block: blk, instr: label, found: "<missing>".into() });
            }
            let (value, ptr) = (operand_values[0], operand_values[1]);
            match ptr.ty().pointee() {
                None => {
                    return Err(VerifyError::StoreOperandNotPointer {
                        name,
                        block: blk,
                        instr: label,
                        found: type_to_string(ptr.ty()),
                    })
                }
                Some(pointee) if !ty_eq(value.ty(), pointee) => {
                    return Err(VerifyError::StoreTypeMismatch {
                        name,
                        block: blk,
                        instr: label,
                        value: type_to_string(value.ty()),
                        pointee: type_to_string(pointee),
                    })
                }
                Some(_) => {}
            }
        }

        Opcode::Phi => {
            if operand_values.len() % 2 != 0 {
                return Err(VerifyError::PhiOddOperands { name, block: blk, instr: label });
            }
            let result_ty = instr.base.ty();
            for pair in operand_values.chunks_exact(2) {
                if !ty_eq(pair[0].ty(), result_ty) {
                    return Err(VerifyError::PhiIncomingTypeMismatch {
                        name,
                        block: blk,
                        instr: label,
                        expected: type_to_string(result_ty),
                        found: type_to_string(pair[0].ty()),
                    });
                }
                if pair[1].as_block().is_none() {
                    return Err(VerifyError::PhiIncomingNotBlock { name, block: blk, instr: label });
                }
            }
        }

        Opcode::Gep => {
            if operand_values.is_empty() {
                return Err(VerifyError::GepMissingBase { name, block: blk, instr: label });
            }
            let base_ty = operand_values[0].ty();
            if base_ty.pointee().is_none() {
                return Err(VerifyError::GepBaseNotPointer { name, block: blk, instr: label, found: type_to_string(base_ty) });
            }
            let source_type = instr.gep_source_type().expect("gep always carries a source type");
            let indices = &operand_values[1..];
            let final_type = match calir_ir::builder::gep_walk_type(source_type, indices) {
                Ok(t) => t,
                Err(IrError::GepIndexNotConstant) => return Err(VerifyError::GepIndexNotConstant { name, block: blk, instr: label }),
                Err(IrError::GepIndexOutOfBounds(i)) => {
                    return Err(VerifyError::GepIndexOutOfBounds { name, block: blk, instr: label, index: i })
                }
                Err(IrError::GepNonAggregate) => {
                    return Err(VerifyError::GepNonAggregate { name, block: blk, instr: label, found: type_to_string(source_type) })
                }
                Err(other) => unreachable!("gep_walk_type never returns {other:?}"),
            };
            match instr.base.ty().pointee() {
                Some(p) if ty_eq(p, final_type) => {}
                _ => {
                    return Err(VerifyError::GepResultTypeMismatch {
                        name,
                        block: blk,
                        instr: label,
                        expected: format!("<{}>", type_to_string(final_type)),
                        found: type_to_string(instr.base.ty()),
                    })
                }
            }
        }

        Opcode::Call => {
            if operand_values.is_empty() {
                return Err(VerifyError::CallNotCallable { name, block: blk, instr: label, found: "<missing>".into() });
            }
            let callee = operand_values[0];
            let sig = match callee.ty().pointee().and_then(|p| p.as_function()) {
                Some(sig) => sig,
                None => {
                    return Err(VerifyError::CallNotCallable { name, block: blk, instr: label, found: type_to_string(callee.ty()) })
                }
            };
            let args = &operand_values[1..];
            let arity_ok = if sig.variadic { args.len() >= sig.params.len() } else { args.len() == sig.params.len() };
            if !arity_ok {
                return Err(VerifyError::CallArityMismatch {
                    name,
                    block: blk,
                    instr: label,
                    expected: if sig.variadic { format!("{}+", sig.params.len()) } else { sig.params.len().to_string() },
                    found: args.len(),
                });
            }
            for (index, (arg, param_ty)) in args.iter().zip(sig.params.iter()).enumerate() {
                if !ty_eq(arg.ty(), param_ty) {
                    return Err(VerifyError::CallArgTypeMismatch {
                        name,
                        block: blk,
                        instr: label,
                        index,
                        expected: type_to_string(param_ty),
                        found: type_to_string(arg.ty()),
                    });
                }
            }
            if !ty_eq(instr.base.ty(), sig.ret) {
                return Err(VerifyError::CallResultTypeMismatch {
                    name,
                    block: blk,
                    instr: label,
                    expected: type_to_string(sig.ret),
                    found: type_to_string(instr.base.ty()),
                });
            }
        }
    }

    verify_def_use(fn_name, block_name, instr, &operands)?;
    if instr.opcode != Opcode::Phi {
        verify_intra_block_dominance(fn_name, block_name, block, instr, &operand_values)?;
    }
    Ok(())
}

/// Each operand's `Use` must appear in its value's uses list, and that
/// `Use`'s `user` back-pointer must name the instruction that owns it.
fn verify_def_use<'a>(
    fn_name: &str,
    block_name: &str,
    instr: &Instruction<'a>,
    operands: &[&calir_ir::value::Use<'a>],
) -> Result<(), VerifyError> {
    for (index, u) in operands.iter().enumerate() {
        if !std::ptr::eq(u.user(), instr) {
            return Err(VerifyError::UseUserMismatch {
                name: fn_name.to_string(),
                block: block_name.to_string(),
                instr: instr_label(instr),
                index,
            });
        }
        let recorded = u.value().base().uses();
        if !recorded.iter().any(|recorded_use| std::ptr::eq(*recorded_use, *u)) {
            return Err(VerifyError::UseNotRecorded {
                name: fn_name.to_string(),
                block: block_name.to_string(),
                instr: instr_label(instr),
                index,
            });
        }
    }
    Ok(())
}

/// A non-PHI instruction that consumes another instruction's result in the
/// same block must appear after it. Cross-block dominance is not checked —
/// it would require a dominator-tree analysis this verifier doesn't build.
fn verify_intra_block_dominance<'a>(
    fn_name: &str,
    block_name: &str,
    block: &BasicBlock<'a>,
    instr: &'a Instruction<'a>,
    operand_values: &[ValueRef<'a>],
) -> Result<(), VerifyError> {
    let use_pos = block.position_of(instr).expect("instr is in this block by construction");
    for (index, value) in operand_values.iter().copied().enumerate() {
        if let ValueRef::Instruction(def) = value {
            if def.parent.get().is_some_and(|p| std::ptr::eq(p, block)) {
                let def_pos = block.position_of(def).expect("def is in this block by construction");
                if def_pos >= use_pos {
                    return Err(VerifyError::UseBeforeDef {
                        name: fn_name.to_string(),
                        block: block_name.to_string(),
                        instr: instr_label(instr),
                        index,
                        def: instr_label(def),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calir_ir::builder::Builder;
    use calir_ir::context::Context;

    fn build_simple_add(ctx: &Context) -> &Module<'_> {
        let i32_ty = ctx.get_i32();
        let module = ctx.create_module("m").unwrap();
        let function = ctx.create_function("add").unwrap();
        let fn_ty = ctx.get_function_type(i32_ty, &[i32_ty, i32_ty], false);
        let sig = fn_ty.as_function().unwrap();
        function.finalize_signature(sig, ctx.get_ptr(fn_ty));
        let a = ctx.create_argument(i32_ty, Some("a"), 0).unwrap();
        let b = ctx.create_argument(i32_ty, Some("b"), 1).unwrap();
        function.push_argument(a);
        function.push_argument(b);
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));
        module.push_function(function);

        let builder = Builder::new(ctx);
        builder.set_insertion_point(entry);
        let sum = builder.create_add(ValueRef::Argument(a), ValueRef::Argument(b), Some("sum")).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(sum))).unwrap();
        module
    }

    #[test]
    fn accepts_a_well_formed_function() {
        let ctx = Context::new();
        let module = build_simple_add(&ctx);
        assert!(verify(module).is_ok());
    }

    #[test]
    fn rejects_a_block_with_no_terminator() {
        let ctx = Context::new();
        let module = ctx.create_module("m").unwrap();
        let function = ctx.create_function("f").unwrap();
        let void_ty = ctx.get_void();
        let fn_ty = ctx.get_function_type(void_ty, &[], false);
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));
        module.push_function(function);

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        builder.create_alloca(ctx.get_i32(), Some("p")).unwrap();

        let errors = verify(module).unwrap_err();
        assert!(matches!(errors[0], VerifyError::MissingTerminator { .. }));
    }

    #[test]
    fn rejects_alloca_outside_entry_block() {
        let ctx = Context::new();
        let module = ctx.create_module("m").unwrap();
        let function = ctx.create_function("f").unwrap();
        let void_ty = ctx.get_void();
        let fn_ty = ctx.get_function_type(void_ty, &[], false);
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let entry = ctx.create_block(Some("entry")).unwrap();
        let second = ctx.create_block(Some("second")).unwrap();
        function.push_block(entry);
        function.push_block(second);
        entry.parent.set(Some(function));
        second.parent.set(Some(function));
        module.push_function(function);

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        builder.create_br(second).unwrap();
        builder.set_insertion_point(second);
        builder.create_alloca(ctx.get_i32(), Some("p")).unwrap();
        builder.create_ret(None).unwrap();

        let errors = verify(module).unwrap_err();
        assert!(matches!(errors[0], VerifyError::AllocaOutsideEntry { .. }));
    }

    #[test]
    fn rejects_mismatched_binary_operand_types() {
        let ctx = Context::new();
        let module = ctx.create_module("m").unwrap();
        let function = ctx.create_function("f").unwrap();
        let i32_ty = ctx.get_i32();
        let fn_ty = ctx.get_function_type(i32_ty, &[], false);
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));
        module.push_function(function);

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let a = ValueRef::Constant(ctx.const_int(i32_ty, 1));
        let b = ValueRef::Constant(ctx.const_int(ctx.get_i64(), 2));
        let sum = builder.create_add(a, b, Some("sum")).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(sum))).unwrap();

        let errors = verify(module).unwrap_err();
        assert!(matches!(errors[0], VerifyError::BinaryOperandTypeMismatch { .. }));
    }

    #[test]
    fn rejects_use_before_def_in_the_same_block() {
        let ctx = Context::new();
        let module = ctx.create_module("m").unwrap();
        let function = ctx.create_function("f").unwrap();
        let i32_ty = ctx.get_i32();
        let fn_ty = ctx.get_function_type(i32_ty, &[], false);
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));
        module.push_function(function);

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let one = ValueRef::Constant(ctx.const_int(i32_ty, 1));
        let first = builder.create_add(one, one, Some("first")).unwrap();
        let second = builder.create_add(one, one, Some("second")).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(first))).unwrap();

        // Manually retarget one of `first`'s operands to use `second`,
        // which is defined later in the same block — an ordering
        // violation the builder's normal call sequence can't produce.
        let operand = first.operand(0).unwrap();
        calir_ir::value::retarget(operand, ValueRef::Instruction(second));

        let errors = verify(module).unwrap_err();
        assert!(matches!(errors[0], VerifyError::UseBeforeDef { .. }));
    }
}
