//! Tree-walking interpreter for Calir IR.
//!
//! [`Interpreter`] owns what outlives any one call (global storage, the
//! FFI table, the data layout); [`context::ExecutionContext`] — private,
//! reached only through [`Interpreter::run`] — owns what's scoped to one
//! call (its `alloca` arena, its frame of bound runtime values). Running
//! IR that hasn't passed `calir_verify::verify` first is undefined: the
//! dispatch loop leans on `.expect()`/`unreachable!()` at the invariants
//! the verifier is responsible for, the same way a release-mode LLVM
//! interpreter trusts its own verifier pass.

mod context;
pub mod error;
mod memory;
mod interp;
pub mod value;

pub use error::{DivisionKind, RuntimeError};
pub use interp::{Interpreter, DEFAULT_STACK_LIMIT};
pub use value::RuntimeValue;

#[cfg(test)]
mod tests {
    use super::*;
    use calir_ir::builder::Builder;
    use calir_ir::context::Context;
    use calir_ir::layout::DataLayout;
    use calir_ir::value::ValueRef;

    /// `gep` into a global array-of-structs, then `load` the selected
    /// field — exercises global storage, multi-level GEP descent, and
    /// the byte-offset arithmetic against a real `DataLayout`.
    #[test]
    fn gep_into_a_global_array_of_structs_then_loads_a_field() {
        use calir_ir::module::GlobalVariable;
        use calir_ir::value::ValueBase;

        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let point_ty = ctx.get_anon_struct(&[i32_ty, i32_ty]);
        let array_ty = ctx.get_array(point_ty, 4);

        let module = ctx.create_module("m").unwrap();
        let global = ctx
            .ir_arena()
            .alloc(GlobalVariable {
                base: ValueBase::new(ctx.get_ptr(array_ty), Some(ctx.intern_str("points"))),
                allocated_type: array_ty,
                initializer: None,
            })
            .unwrap();
        module.push_global(global);

        let fn_ty = ctx.get_function_type(i32_ty, &[i32_ty], false);
        let function = ctx.create_function("y_of").unwrap();
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let index = ctx.create_argument(i32_ty, Some("index"), 0).unwrap();
        function.push_argument(index);
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));
        module.push_function(function);

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let zero = ValueRef::Constant(ctx.const_int(i32_ty, 0));
        let field_y = ValueRef::Constant(ctx.const_int(i32_ty, 1));
        let field = builder
            .create_gep(
                array_ty,
                ValueRef::Global(global),
                &[zero, ValueRef::Argument(index), field_y],
                true,
                Some("y_ptr"),
            )
            .unwrap();
        let loaded = builder.create_load(ValueRef::Instruction(field), Some("y")).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(loaded))).unwrap();

        let interp = Interpreter::new(DataLayout::host());
        interp.load_globals(module).unwrap();

        // Write point[2].y = 20 directly through the global's address.
        let base_addr = interp.global_address(global).unwrap();
        let layout = DataLayout::host();
        let point_offset = layout.size_of(point_ty) as usize * 2;
        let y_offset = layout.struct_member_offset(&[i32_ty, i32_ty], 1) as usize;
        unsafe {
            std::ptr::write((base_addr + point_offset + y_offset) as *mut i32, 20);
        }

        let result = interp.run(function, &[RuntimeValue::I32(2)]).unwrap();
        assert_eq!(result, Some(RuntimeValue::I32(20)));
    }
}
