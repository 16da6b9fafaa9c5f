//! Canonical text printer. Sink-polymorphic: anything implementing
//! `std::fmt::Write` can receive the output, so callers can print into a
//! `String`, a file, or any other buffer without an intermediate
//! allocation forced on them.
//!
//! Output is exactly what `calir-text`'s parser accepts back — the
//! round-trip property the data model's invariant 7 and the text format
//! section both rely on.

use crate::block::BasicBlock;
use crate::function::Function;
use crate::instr::{Instruction, Opcode};
use crate::module::Module;
use crate::types::{Ty, TypeKind};
use crate::value::ValueRef;
use std::fmt::{self, Write};

pub fn print_module<W: Write>(out: &mut W, module: &Module<'_>) -> fmt::Result {
    writeln!(out, "module = \"{}\"", module.name)?;

    let mut named_structs = Vec::new();
    collect_named_structs(module, &mut named_structs);
    if !named_structs.is_empty() {
        writeln!(out)?;
        for ty in &named_structs {
            if let TypeKind::Struct(body) = &ty.kind {
                write!(out, "%{} = type {{ ", body.name.unwrap())?;
                print_member_list(out, body.members)?;
                writeln!(out, " }}")?;
            }
        }
    }

    if !module.globals().is_empty() {
        writeln!(out)?;
        for global in module.globals() {
            write!(out, "@{} = global ", global.base.name().unwrap_or(""))?;
            print_type(out, global.allocated_type)?;
            write!(out, " ")?;
            match global.initializer {
                Some(value) => print_value_ref(out, value)?,
                None => write!(out, "zeroinitializer")?,
            }
            writeln!(out)?;
        }
    }

    for function in module.functions() {
        writeln!(out)?;
        print_function(out, function)?;
    }
    Ok(())
}

/// Walk every type reachable from `module`'s functions and globals,
/// collecting named struct types in first-encountered order, deduplicated
/// by pointer. The preamble needs this set since a `Module` itself has no
/// registry of the named structs its values happen to mention.
fn collect_named_structs<'ctx>(module: &Module<'ctx>, out: &mut Vec<Ty<'ctx>>) {
    fn visit<'ctx>(ty: Ty<'ctx>, out: &mut Vec<Ty<'ctx>>) {
        match &ty.kind {
            TypeKind::Struct(body) if body.name.is_some() => {
                if !out.iter().any(|seen| std::ptr::eq(*seen, ty)) {
                    for member in body.members {
                        visit(member, out);
                    }
                    out.push(ty);
                }
            }
            TypeKind::Struct(body) => {
                for member in body.members {
                    visit(member, out);
                }
            }
            TypeKind::Ptr(pointee) => visit(pointee, out),
            TypeKind::Array(elem, _) => visit(elem, out),
            TypeKind::Function(sig) => {
                visit(sig.ret, out);
                for param in sig.params {
                    visit(param, out);
                }
            }
            _ => {}
        }
    }

    for global in module.globals() {
        visit(global.allocated_type, out);
    }
    for function in module.functions() {
        if let Some(sig) = function.signature() {
            visit(sig.ret, out);
            for param in sig.params {
                visit(param, out);
            }
        }
        for block in function.blocks() {
            for instr in block.instructions() {
                visit(instr.base.ty(), out);
            }
        }
    }
}

fn print_function<W: Write>(out: &mut W, function: &Function<'_>) -> fmt::Result {
    let keyword = if function.is_definition() { "define" } else { "declare" };
    let sig = function.signature();
    let ret_ty = sig.map(|s| s.ret);
    write!(out, "{keyword} ")?;
    match ret_ty {
        Some(t) => print_type(out, t)?,
        None => write!(out, "void")?,
    }
    write!(out, " @{}(", function.base.name().unwrap_or(""))?;

    let args = function.arguments();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        if function.is_definition() {
            write!(out, "%{}: ", arg.base.name().unwrap_or(""))?;
        }
        print_type(out, arg.base.ty())?;
    }
    if let Some(sig) = sig {
        if sig.variadic {
            if !args.is_empty() {
                write!(out, ", ")?;
            }
            write!(out, "...")?;
        }
    }
    write!(out, ")")?;

    if function.is_declaration() {
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, " {{")?;
    for block in function.blocks() {
        print_block(out, block)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn print_block<W: Write>(out: &mut W, block: &BasicBlock<'_>) -> fmt::Result {
    writeln!(out, "${}:", block.base.name().unwrap_or(""))?;
    for instr in block.instructions() {
        write!(out, "  ")?;
        print_instruction(out, instr)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_instruction<W: Write>(out: &mut W, instr: &Instruction<'_>) -> fmt::Result {
    let has_result = !matches!(instr.opcode, Opcode::Ret | Opcode::Br | Opcode::CondBr | Opcode::Store);
    if has_result {
        write!(out, "%{}: ", instr.base.name().unwrap_or(""))?;
        print_type(out, instr.base.ty())?;
        write!(out, " = ")?;
    }

    match instr.opcode {
        Opcode::Ret => {
            write!(out, "ret")?;
            if let Some(operand) = instr.operand(0) {
                write!(out, " ")?;
                print_operand(out, operand.value())?;
            }
        }
        Opcode::Br => {
            write!(out, "br ")?;
            print_operand(out, instr.operand(0).unwrap().value())?;
        }
        Opcode::CondBr => {
            write!(out, "cond_br ")?;
            print_operand(out, instr.operand(0).unwrap().value())?;
            write!(out, ", ")?;
            print_operand(out, instr.operand(1).unwrap().value())?;
            write!(out, ", ")?;
            print_operand(out, instr.operand(2).unwrap().value())?;
        }
        Opcode::Add | Opcode::Sub => {
            write!(out, "{} ", instr.opcode.mnemonic())?;
            print_operand(out, instr.operand(0).unwrap().value())?;
            write!(out, ", ")?;
            print_operand(out, instr.operand(1).unwrap().value())?;
        }
        Opcode::Icmp => {
            write!(out, "icmp {} ", instr.icmp_predicate().unwrap().mnemonic())?;
            print_operand(out, instr.operand(0).unwrap().value())?;
            write!(out, ", ")?;
            print_operand(out, instr.operand(1).unwrap().value())?;
        }
        Opcode::Alloca => {
            write!(out, "alloca ")?;
            print_type(out, instr.base.ty().pointee().expect("alloca result is always a pointer"))?;
        }
        Opcode::Load => {
            write!(out, "load ")?;
            print_operand(out, instr.operand(0).unwrap().value())?;
        }
        Opcode::Store => {
            write!(out, "store ")?;
            print_operand(out, instr.operand(0).unwrap().value())?;
            write!(out, ", ")?;
            print_operand(out, instr.operand(1).unwrap().value())?;
        }
        Opcode::Phi => {
            write!(out, "phi ")?;
            for (i, (value, block)) in instr.phi_incoming().into_iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                write!(out, "[ ")?;
                print_value_ref(out, value)?;
                write!(out, ": ")?;
                print_type(out, value.ty())?;
                write!(out, ", ${} ]", block.base.name().unwrap_or(""))?;
            }
        }
        Opcode::Gep => {
            write!(out, "gep ")?;
            print_type(out, instr.gep_source_type().unwrap())?;
            if instr.gep_inbounds().unwrap_or(false) {
                write!(out, " inbounds")?;
            }
            for operand in instr.operands() {
                write!(out, ", ")?;
                print_operand(out, operand.value())?;
            }
        }
        Opcode::Call => {
            let operands = instr.operands();
            write!(out, "call ")?;
            print_operand(out, operands[0].value())?;
            write!(out, "(")?;
            for (i, operand) in operands.iter().skip(1).enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                print_operand(out, operand.value())?;
            }
            write!(out, ")")?;
        }
    }
    Ok(())
}

/// `name: type` — the form every operand takes at a use site.
fn print_operand<W: Write>(out: &mut W, value: ValueRef<'_>) -> fmt::Result {
    print_value_ref(out, value)?;
    write!(out, ": ")?;
    print_type(out, value.ty())
}

fn print_value_ref<W: Write>(out: &mut W, value: ValueRef<'_>) -> fmt::Result {
    match value {
        ValueRef::Argument(a) => write!(out, "%{}", a.base.name().unwrap_or("")),
        ValueRef::Instruction(i) => write!(out, "%{}", i.base.name().unwrap_or("")),
        ValueRef::Block(b) => write!(out, "${}", b.base.name().unwrap_or("")),
        ValueRef::Function(f) => write!(out, "@{}", f.base.name().unwrap_or("")),
        ValueRef::Global(g) => write!(out, "@{}", g.base.name().unwrap_or("")),
        ValueRef::Constant(c) => match c.kind {
            crate::consts::ConstantKind::Int(v) => write!(out, "{v}"),
            crate::consts::ConstantKind::Float(v) => write!(out, "{v}"),
            crate::consts::ConstantKind::Undef => write!(out, "undef"),
            crate::consts::ConstantKind::ZeroInitializer => write!(out, "zeroinitializer"),
        },
    }
}

fn print_member_list<W: Write>(out: &mut W, members: &[Ty<'_>]) -> fmt::Result {
    for (i, m) in members.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        print_type(out, m)?;
    }
    Ok(())
}

/// Pointer types render as `<pointee>`; anonymous structs as `{ T1, T2 }`;
/// named structs by their `%Name`.
pub fn print_type<W: Write>(out: &mut W, ty: Ty<'_>) -> fmt::Result {
    match &ty.kind {
        TypeKind::Void => write!(out, "void"),
        TypeKind::Int(w) => write!(out, "i{w}"),
        TypeKind::Float32 => write!(out, "f32"),
        TypeKind::Float64 => write!(out, "f64"),
        TypeKind::Label => write!(out, "label"),
        TypeKind::Ptr(pointee) => {
            write!(out, "<")?;
            print_type(out, pointee)?;
            write!(out, ">")
        }
        TypeKind::Array(elem, count) => {
            write!(out, "[{count} x ")?;
            print_type(out, elem)?;
            write!(out, "]")
        }
        TypeKind::Struct(body) => match body.name {
            Some(name) => write!(out, "%{name}"),
            None => {
                write!(out, "{{ ")?;
                print_member_list(out, body.members)?;
                write!(out, " }}")
            }
        },
        TypeKind::Function(sig) => {
            print_type(out, sig.ret)?;
            write!(out, "(")?;
            for (i, p) in sig.params.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                print_type(out, p)?;
            }
            if sig.variadic {
                if !sig.params.is_empty() {
                    write!(out, ", ")?;
                }
                write!(out, "...")?;
            }
            write!(out, ")")
        }
    }
}

/// Render `ty` to an owned `String` — the common case when a caller just
/// wants one type's textual form (diagnostics, the verifier) rather than
/// writing into a shared sink.
pub fn type_to_string(ty: Ty<'_>) -> String {
    let mut s = String::new();
    print_type(&mut s, ty).expect("writing to a String never fails");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn prints_scalar_types() {
        let ctx = Context::new();
        assert_eq!(type_to_string(ctx.get_i32()), "i32");
        assert_eq!(type_to_string(ctx.get_void()), "void");
        assert_eq!(type_to_string(ctx.get_ptr(ctx.get_i8())), "<i8>");
    }

    #[test]
    fn prints_anonymous_struct() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let i8_ty = ctx.get_i8();
        let s = ctx.get_anon_struct(&[i8_ty, i32_ty]);
        assert_eq!(type_to_string(s), "{ i8, i32 }");
    }

    #[test]
    fn prints_array_type() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let arr = ctx.get_array(i32_ty, 10);
        assert_eq!(type_to_string(arr), "[10 x i32]");
    }

    #[test]
    fn prints_empty_module() {
        let ctx = Context::new();
        let module = ctx.create_module("m").unwrap();
        let mut s = String::new();
        print_module(&mut s, module).unwrap();
        assert_eq!(s, "module = \"m\"\n");
    }
}
