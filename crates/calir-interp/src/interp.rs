//! The interpreter's long-lived state: global storage, the FFI table,
//! and the data layout every call measures against. [`ExecutionContext`]
//! (see [`crate::context`]) holds everything that's scoped to one call
//! instead.

use std::cell::RefCell;
use std::collections::HashMap;

use calir_arena::Arena;
use calir_ir::function::Function;
use calir_ir::layout::DataLayout;
use calir_ir::module::{GlobalVariable, Module};

use crate::context;
use crate::error::{Result, RuntimeError};
use crate::memory;
use crate::value::RuntimeValue;

/// Default byte limit for a single call's `alloca` arena. Chosen to be
/// generous for ordinary recursion depths while still catching runaway
/// recursion in finite time instead of exhausting host memory.
pub const DEFAULT_STACK_LIMIT: usize = 1 << 20;

type FfiFn = dyn Fn(&[RuntimeValue]) -> Result<RuntimeValue>;

/// Owns what a single call doesn't: global storage, registered FFI
/// callbacks, and the layout rules every size/alignment/offset
/// computation is made against. Not generic over `'ctx` — every method
/// takes the IR it needs by reference, so one `Interpreter` can drive
/// calls into modules built against different `Context`s in sequence
/// (though never concurrently; see the crate's single-threaded model).
pub struct Interpreter {
    layout: DataLayout,
    globals_arena: Arena,
    globals: RefCell<HashMap<usize, usize>>,
    ffi: RefCell<HashMap<String, Box<FfiFn>>>,
    stack_limit: usize,
}

impl Interpreter {
    pub fn new(layout: DataLayout) -> Self {
        Interpreter {
            layout,
            globals_arena: Arena::new(),
            globals: RefCell::new(HashMap::new()),
            ffi: RefCell::new(HashMap::new()),
            stack_limit: DEFAULT_STACK_LIMIT,
        }
    }

    /// Replace the default per-call stack arena limit.
    pub fn with_stack_limit(mut self, limit: usize) -> Self {
        self.stack_limit = limit;
        self
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub(crate) fn stack_limit(&self) -> usize {
        self.stack_limit
    }

    /// Register a host callback that `call`s to a function with no IR
    /// definition dispatch to, keyed by that function's name. Replaces
    /// any previous binding for the same name.
    pub fn register_ffi<F>(&self, name: &str, f: F)
    where
        F: Fn(&[RuntimeValue]) -> Result<RuntimeValue> + 'static,
    {
        self.ffi.borrow_mut().insert(name.to_string(), Box::new(f));
    }

    pub(crate) fn invoke_ffi(&self, name: &str, args: &[RuntimeValue]) -> Result<RuntimeValue> {
        let ffi = self.ffi.borrow();
        let callback = ffi.get(name).ok_or_else(|| RuntimeError::UnboundExternal { name: name.to_string() })?;
        callback(args)
    }

    /// Allocate persistent storage for every global in `module` that
    /// doesn't already have it, and write each one's initializer (or
    /// zero bytes, for a declaration with none). Idempotent per global —
    /// safe to call once per loaded module even across repeated `run`s.
    pub fn load_globals(&self, module: &Module<'_>) -> Result<()> {
        log::debug!("loading globals for module \"{}\"", module.name);
        for global in module.globals() {
            let key = global as *const GlobalVariable<'_> as usize;
            if self.globals.borrow().contains_key(&key) {
                continue;
            }
            let size = self.layout.size_of(global.allocated_type) as usize;
            let align = self.layout.align_of(global.allocated_type).max(1) as usize;
            let raw_layout = std::alloc::Layout::from_size_align(size, align)
                .expect("calir-ir's DataLayout only ever reports power-of-two alignments");
            let ptr = self
                .globals_arena
                .alloc_raw(raw_layout)
                .map_err(|e| RuntimeError::GlobalAllocFailed { reason: e.to_string() })?;
            // SAFETY: `ptr` was just bumped for exactly `size` bytes.
            unsafe { std::ptr::write_bytes(ptr, 0, size) };
            let addr = ptr as usize;
            self.globals.borrow_mut().insert(key, addr);

            if let Some(initializer) = global.initializer {
                if let Some(constant) = initializer.as_constant() {
                    let value = memory::constant_to_runtime(constant, global.allocated_type)?;
                    // SAFETY: `addr` was just sized and zeroed for
                    // `global.allocated_type` above.
                    unsafe { memory::write_value(global.allocated_type, addr, value)? };
                }
            }
        }
        Ok(())
    }

    pub(crate) fn global_address(&self, global: &GlobalVariable<'_>) -> Option<usize> {
        let key = global as *const GlobalVariable<'_> as usize;
        self.globals.borrow().get(&key).copied()
    }

    /// Run `function` with `args` bound to its arguments, from its entry
    /// block to the `ret` that ends the call. `function` must be a
    /// definition (`function.is_definition()`); the caller — `call`'s own
    /// dispatch, or the top-level caller — is responsible for routing
    /// declarations to [`Interpreter::invoke_ffi`] instead.
    pub fn run(&self, function: &Function<'_>, args: &[RuntimeValue]) -> Result<Option<RuntimeValue>> {
        log::trace!("entering @{}", function.base.name().unwrap_or("<anonymous>"));
        let result = context::run(self, function, args);
        if let Err(ref e) = result {
            log::warn!("@{} failed: {e}", function.base.name().unwrap_or("<anonymous>"));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calir_ir::builder::Builder;
    use calir_ir::context::Context;
    use calir_ir::instr::IcmpPredicate;
    use calir_ir::value::ValueRef;

    #[test]
    fn runs_a_simple_add() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let fn_ty = ctx.get_function_type(i32_ty, &[i32_ty, i32_ty], false);
        let function = ctx.create_function("add").unwrap();
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let a = ctx.create_argument(i32_ty, Some("a"), 0).unwrap();
        let b = ctx.create_argument(i32_ty, Some("b"), 1).unwrap();
        function.push_argument(a);
        function.push_argument(b);
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let sum = builder.create_add(ValueRef::Argument(a), ValueRef::Argument(b), Some("sum")).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(sum))).unwrap();

        let interp = Interpreter::new(DataLayout::host());
        let result = interp.run(function, &[RuntimeValue::I32(2), RuntimeValue::I32(40)]).unwrap();
        assert_eq!(result, Some(RuntimeValue::I32(42)));
    }

    /// `if a < b { a } else { b }`, via `cond_br` and a `phi` that merges
    /// the two arms — exercises PHI-at-predecessor resolution.
    #[test]
    fn runs_a_branch_with_phi_merge() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let fn_ty = ctx.get_function_type(i32_ty, &[i32_ty, i32_ty], false);
        let function = ctx.create_function("min").unwrap();
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let a = ctx.create_argument(i32_ty, Some("a"), 0).unwrap();
        let b = ctx.create_argument(i32_ty, Some("b"), 1).unwrap();
        function.push_argument(a);
        function.push_argument(b);

        let entry = ctx.create_block(Some("entry")).unwrap();
        let then_blk = ctx.create_block(Some("then")).unwrap();
        let else_blk = ctx.create_block(Some("else")).unwrap();
        let merge = ctx.create_block(Some("merge")).unwrap();
        for blk in [entry, then_blk, else_blk, merge] {
            function.push_block(blk);
            blk.parent.set(Some(function));
        }

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let cond = builder.create_icmp(IcmpPredicate::Slt, ValueRef::Argument(a), ValueRef::Argument(b), Some("cond")).unwrap();
        builder.create_cond_br(ValueRef::Instruction(cond), then_blk, else_blk).unwrap();

        builder.set_insertion_point(then_blk);
        builder.create_br(merge).unwrap();

        builder.set_insertion_point(else_blk);
        builder.create_br(merge).unwrap();

        builder.set_insertion_point(merge);
        let phi = builder.create_phi(i32_ty, Some("result")).unwrap();
        builder.phi_add_incoming(phi, ValueRef::Argument(a), then_blk).unwrap();
        builder.phi_add_incoming(phi, ValueRef::Argument(b), else_blk).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(phi))).unwrap();

        let interp = Interpreter::new(DataLayout::host());
        let result = interp.run(function, &[RuntimeValue::I32(3), RuntimeValue::I32(7)]).unwrap();
        assert_eq!(result, Some(RuntimeValue::I32(3)));
        let result = interp.run(function, &[RuntimeValue::I32(9), RuntimeValue::I32(1)]).unwrap();
        assert_eq!(result, Some(RuntimeValue::I32(1)));
    }

    #[test]
    fn alloca_store_load_round_trips() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let fn_ty = ctx.get_function_type(i32_ty, &[i32_ty], false);
        let function = ctx.create_function("through_memory").unwrap();
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let a = ctx.create_argument(i32_ty, Some("a"), 0).unwrap();
        function.push_argument(a);
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let slot = builder.create_alloca(i32_ty, Some("slot")).unwrap();
        builder.create_store(ValueRef::Argument(a), ValueRef::Instruction(slot)).unwrap();
        let loaded = builder.create_load(ValueRef::Instruction(slot), Some("loaded")).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(loaded))).unwrap();

        let interp = Interpreter::new(DataLayout::host());
        let result = interp.run(function, &[RuntimeValue::I32(99)]).unwrap();
        assert_eq!(result, Some(RuntimeValue::I32(99)));
    }

    #[test]
    fn stack_overflow_is_reported_when_a_frame_exceeds_the_limit() {
        let ctx = Context::new();
        let void_ty = ctx.get_void();
        let big_ty = ctx.get_array(ctx.get_i64(), 64);
        let fn_ty = ctx.get_function_type(void_ty, &[], false);
        let function = ctx.create_function("big_frame").unwrap();
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        // A single 512-byte alloca against a 64-byte stack limit fails
        // deterministically, no recursion needed.
        builder.create_alloca(big_ty, Some("buf")).unwrap();
        builder.create_ret(None).unwrap();

        let interp = Interpreter::new(DataLayout::host()).with_stack_limit(64);
        let err = interp.run(function, &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::StackOverflow { .. }));
    }

    #[test]
    fn calls_dispatch_to_a_registered_ffi_callback() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let extern_ty = ctx.get_function_type(i32_ty, &[i32_ty], false);
        let extern_fn = ctx.create_function("host_double").unwrap();
        extern_fn.finalize_signature(extern_ty.as_function().unwrap(), ctx.get_ptr(extern_ty));
        // No blocks pushed: a declaration, which routes through FFI.

        let fn_ty = ctx.get_function_type(i32_ty, &[i32_ty], false);
        let function = ctx.create_function("caller").unwrap();
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let a = ctx.create_argument(i32_ty, Some("a"), 0).unwrap();
        function.push_argument(a);
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        let call = builder.create_call(ValueRef::Function(extern_fn), &[ValueRef::Argument(a)], Some("doubled")).unwrap();
        builder.create_ret(Some(ValueRef::Instruction(call))).unwrap();

        let interp = Interpreter::new(DataLayout::host());
        interp.register_ffi("host_double", |args| match args {
            [RuntimeValue::I32(v)] => Ok(RuntimeValue::I32(v.wrapping_mul(2))),
            _ => panic!("unexpected FFI arguments"),
        });

        let result = interp.run(function, &[RuntimeValue::I32(21)]).unwrap();
        assert_eq!(result, Some(RuntimeValue::I32(42)));
    }

    #[test]
    fn calling_an_unbound_external_reports_the_missing_name() {
        let ctx = Context::new();
        let void_ty = ctx.get_void();
        let missing_ty = ctx.get_function_type(void_ty, &[], false);
        let missing_fn = ctx.create_function("not_registered").unwrap();
        missing_fn.finalize_signature(missing_ty.as_function().unwrap(), ctx.get_ptr(missing_ty));

        let fn_ty = ctx.get_function_type(void_ty, &[], false);
        let function = ctx.create_function("caller").unwrap();
        function.finalize_signature(fn_ty.as_function().unwrap(), ctx.get_ptr(fn_ty));
        let entry = ctx.create_block(Some("entry")).unwrap();
        function.push_block(entry);
        entry.parent.set(Some(function));

        let builder = Builder::new(&ctx);
        builder.set_insertion_point(entry);
        builder.create_call(ValueRef::Function(missing_fn), &[], None).unwrap();
        builder.create_ret(None).unwrap();

        let interp = Interpreter::new(DataLayout::host());
        let err = interp.run(function, &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::UnboundExternal { name } if name == "not_registered"));
    }
}
