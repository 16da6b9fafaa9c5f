//! `Context`: the one long-lived resource. Owns the permanent arena (types,
//! constants, interned strings — survive IR-arena resets) and the IR arena
//! (modules, functions, blocks, instructions, uses — discarded wholesale by
//! [`Context::reset_ir`]), plus every uniquing cache described in the data
//! model.
//!
//! Every public getter returns a reference whose lifetime is the call's own
//! borrow of `&self`. A handful of them first consult a cache keyed on
//! plain `usize` addresses rather than on typed references — `Context`
//! itself stays a concrete, non-generic type (no `Context<'ctx>` quietly
//! trying to be self-referential), and getters reconstruct the typed
//! reference from the cached address with a short, locally-justified
//! `unsafe` block: the address was produced by `self.permanent.alloc`, and
//! `permanent` is never reset or moved while any borrow of `self` is alive,
//! so the data behind it outlives every caller-visible lifetime we hand
//! back. `reset_ir` never touches `permanent`, so those addresses stay
//! valid across IR-arena resets, giving the pointer-equality-after-reset
//! guarantee the data model requires.

use crate::consts::ConstantData;
use crate::types::{FunctionSig, StructBody, Ty, TypeData, TypeKind};
use crate::value::ValueBase;
use calir_arena::Arena;
use calir_collections::{FloatKey, FnOps, HashTable};
use std::cell::RefCell;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct ArrayKey {
    elem: usize,
    count: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct IntConstKey {
    ty: usize,
    value: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct FloatConstKey {
    ty: usize,
    bits: FloatKey,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct UndefKey {
    ty: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct ZeroKey {
    ty: usize,
}

/// Key for the function-type cache: return type, ordered parameter types,
/// and the variadic flag. `Hash`/`Eq` are written by hand rather than
/// derived, comparing parameter lists element-by-element by address —
/// functionally what `#[derive]` over `Vec<usize>` would give us, spelled
/// out because this is the one cache in `Context` that most naturally
/// wants it (the others reach for `#[derive]` or the generic `FnOps`
/// variant instead).
struct FunctionKey {
    ret: usize,
    params: Vec<usize>,
    variadic: bool,
}

impl PartialEq for FunctionKey {
    fn eq(&self, other: &Self) -> bool {
        self.ret == other.ret && self.variadic == other.variadic && self.params == other.params
    }
}
impl Eq for FunctionKey {}
impl std::hash::Hash for FunctionKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ret.hash(state);
        self.variadic.hash(state);
        self.params.hash(state);
    }
}

fn hash_member_vec(v: &Vec<usize>) -> u64 {
    use std::hash::{Hash, Hasher};
    struct X(xxhash_rust::xxh3::Xxh3);
    impl Hasher for X {
        fn finish(&self) -> u64 {
            self.0.digest()
        }
        fn write(&mut self, bytes: &[u8]) {
            self.0.update(bytes);
        }
    }
    let mut hasher = X(xxhash_rust::xxh3::Xxh3::new());
    v.hash(&mut hasher);
    hasher.finish()
}

fn eq_member_vec(a: &Vec<usize>, b: &Vec<usize>) -> bool {
    a == b
}

struct Singletons {
    void: usize,
    i1: usize,
    i8: usize,
    i16: usize,
    i32: usize,
    i64: usize,
    f32: usize,
    f64: usize,
    label: usize,
    i1_true: usize,
    i1_false: usize,
}

pub struct Context {
    permanent: Arena,
    ir: Arena,

    ptr_cache: RefCell<HashTable<usize, usize>>,
    array_cache: RefCell<HashTable<ArrayKey, usize>>,
    anon_struct_cache: RefCell<HashTable<Vec<usize>, usize, FnOps<Vec<usize>>>>,
    named_struct_cache: RefCell<HashTable<String, usize>>,
    function_cache: RefCell<HashTable<FunctionKey, usize>>,

    int_const_cache: RefCell<HashTable<IntConstKey, usize>>,
    float_const_cache: RefCell<HashTable<FloatConstKey, usize>>,
    undef_cache: RefCell<HashTable<UndefKey, usize>>,
    zero_cache: RefCell<HashTable<ZeroKey, usize>>,
    /// Every constant ever minted, so `reset_ir` can clear their uses
    /// lists (see module doc comment and `Context::reset_ir`).
    all_constants: RefCell<Vec<usize>>,

    string_cache: RefCell<HashTable<String, usize>>,

    singletons: Singletons,
}

/// Reconstruct a reference from an address known to have been produced by
/// `self.permanent.alloc`. Sound because `permanent` is never reset,
/// destroyed, or relocated for the lifetime of `self`.
unsafe fn revive<'s, T>(ptr: usize) -> &'s T {
    &*(ptr as *const T)
}

fn addr_of<T>(r: &T) -> usize {
    r as *const T as usize
}

impl Context {
    pub fn new() -> Self {
        let permanent = Arena::new();
        let alloc_ty = |kind: TypeKind<'static>| -> usize {
            // SAFETY: `TypeData<'ctx>`'s layout does not depend on `'ctx`
            // (lifetimes are erased at runtime); allocating the `'static`
            // instantiation and reading it back through any shorter `'s`
            // later is always sound since the data itself never changes.
            let data: TypeData<'static> = TypeData { kind };
            let allocated = permanent.alloc(data).expect("permanent arena OOM during singleton init");
            addr_of(allocated)
        };
        let void = alloc_ty(TypeKind::Void);
        let i1 = alloc_ty(TypeKind::Int(1));
        let i8 = alloc_ty(TypeKind::Int(8));
        let i16 = alloc_ty(TypeKind::Int(16));
        let i32 = alloc_ty(TypeKind::Int(32));
        let i64 = alloc_ty(TypeKind::Int(64));
        let f32 = alloc_ty(TypeKind::Float32);
        let f64 = alloc_ty(TypeKind::Float64);
        let label = alloc_ty(TypeKind::Label);

        let i1_ty: Ty<'static> = unsafe { revive(i1) };
        let i1_true = {
            let data = ConstantData { base: ValueBase::new(i1_ty, None), kind: crate::consts::ConstantKind::Int(1) };
            addr_of(permanent.alloc(data).expect("permanent arena OOM during singleton init"))
        };
        let i1_false = {
            let data = ConstantData { base: ValueBase::new(i1_ty, None), kind: crate::consts::ConstantKind::Int(0) };
            addr_of(permanent.alloc(data).expect("permanent arena OOM during singleton init"))
        };

        Context {
            permanent,
            ir: Arena::new(),
            ptr_cache: RefCell::new(HashTable::new()),
            array_cache: RefCell::new(HashTable::new()),
            anon_struct_cache: RefCell::new(HashTable::with_ops(FnOps { hash_fn: hash_member_vec, eq_fn: eq_member_vec })),
            named_struct_cache: RefCell::new(HashTable::new()),
            function_cache: RefCell::new(HashTable::new()),
            int_const_cache: RefCell::new(HashTable::new()),
            float_const_cache: RefCell::new(HashTable::new()),
            undef_cache: RefCell::new(HashTable::new()),
            zero_cache: RefCell::new(HashTable::new()),
            all_constants: RefCell::new(vec![i1_true, i1_false]),
            string_cache: RefCell::new(HashTable::new()),
            singletons: Singletons { void, i1, i8, i16, i32, i64, f32, f64, label, i1_true, i1_false },
        }
    }

    // ---- type singletons -------------------------------------------------

    pub fn get_void(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.void) }
    }
    pub fn get_i1(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.i1) }
    }
    pub fn get_i8(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.i8) }
    }
    pub fn get_i16(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.i16) }
    }
    pub fn get_i32(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.i32) }
    }
    pub fn get_i64(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.i64) }
    }
    pub fn get_f32(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.f32) }
    }
    pub fn get_f64(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.f64) }
    }
    pub fn get_label(&self) -> Ty<'_> {
        unsafe { revive(self.singletons.label) }
    }

    /// Every integer width the spec allows: 1, 8, 16, 32, 64.
    pub fn get_int(&self, width: u32) -> Option<Ty<'_>> {
        Some(match width {
            1 => self.get_i1(),
            8 => self.get_i8(),
            16 => self.get_i16(),
            32 => self.get_i32(),
            64 => self.get_i64(),
            _ => return None,
        })
    }

    // ---- derived types -----------------------------------------------------

    pub fn get_ptr(&self, pointee: Ty<'_>) -> Ty<'_> {
        let key = addr_of(pointee);
        if let Some(&ptr) = self.ptr_cache.borrow().get(&key) {
            return unsafe { revive(ptr) };
        }
        let data: TypeData<'static> = TypeData { kind: TypeKind::Ptr(unsafe { revive(key) }) };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.ptr_cache.borrow_mut().insert(key, addr);
        unsafe { revive(addr) }
    }

    pub fn get_array(&self, elem: Ty<'_>, count: u64) -> Ty<'_> {
        let key = ArrayKey { elem: addr_of(elem), count };
        if let Some(&ptr) = self.array_cache.borrow().get(&key) {
            return unsafe { revive(ptr) };
        }
        let data: TypeData<'static> = TypeData { kind: TypeKind::Array(unsafe { revive(key.elem) }, count) };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.array_cache.borrow_mut().insert(key, addr);
        unsafe { revive(addr) }
    }

    pub fn get_anon_struct(&self, members: &[Ty<'_>]) -> Ty<'_> {
        let key: Vec<usize> = members.iter().map(|m| addr_of(*m)).collect();
        if let Some(&ptr) = self.anon_struct_cache.borrow().get(&key) {
            return unsafe { revive(ptr) };
        }
        let member_tys: Vec<Ty<'static>> = key.iter().map(|&a| unsafe { revive(a) }).collect();
        let member_slice = self.permanent.alloc_slice_copy(&member_tys).expect("permanent arena OOM");
        let data: TypeData<'static> =
            TypeData { kind: TypeKind::Struct(StructBody { name: None, members: unsafe { revive_slice(member_slice) } }) };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.anon_struct_cache.borrow_mut().insert(key, addr);
        unsafe { revive(addr) }
    }

    pub fn get_named_struct(&self, name: &str, members: &[Ty<'_>]) -> Ty<'_> {
        if let Some(&ptr) = self.named_struct_cache.borrow().get(&name.to_string()) {
            return unsafe { revive(ptr) };
        }
        let interned_name = self.intern_str(name);
        let member_tys: Vec<Ty<'static>> = members.iter().map(|m| unsafe { revive(addr_of(*m)) }).collect();
        let member_slice = self.permanent.alloc_slice_copy(&member_tys).expect("permanent arena OOM");
        let data: TypeData<'static> = TypeData {
            kind: TypeKind::Struct(StructBody {
                name: Some(unsafe { std::mem::transmute::<&str, &'static str>(interned_name) }),
                members: unsafe { revive_slice(member_slice) },
            }),
        };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.named_struct_cache.borrow_mut().insert(name.to_string(), addr);
        unsafe { revive(addr) }
    }

    pub fn lookup_named_struct(&self, name: &str) -> Option<Ty<'_>> {
        self.named_struct_cache.borrow().get(&name.to_string()).map(|&ptr| unsafe { revive(ptr) })
    }

    pub fn get_function_type(&self, ret: Ty<'_>, params: &[Ty<'_>], variadic: bool) -> Ty<'_> {
        let key = FunctionKey { ret: addr_of(ret), params: params.iter().map(|p| addr_of(*p)).collect(), variadic };
        if let Some(&ptr) = self.function_cache.borrow().get(&key) {
            return unsafe { revive(ptr) };
        }
        let param_tys: Vec<Ty<'static>> = key.params.iter().map(|&a| unsafe { revive(a) }).collect();
        let param_slice = self.permanent.alloc_slice_copy(&param_tys).expect("permanent arena OOM");
        let data: TypeData<'static> = TypeData {
            kind: TypeKind::Function(FunctionSig {
                ret: unsafe { revive(key.ret) },
                params: unsafe { revive_slice(param_slice) },
                variadic,
            }),
        };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.function_cache.borrow_mut().insert(key, addr);
        unsafe { revive(addr) }
    }

    // ---- constants ---------------------------------------------------------

    pub fn const_int(&self, ty: Ty<'_>, value: u64) -> &'_ ConstantData<'_> {
        let key = IntConstKey { ty: addr_of(ty), value };
        if let Some(&ptr) = self.int_const_cache.borrow().get(&key) {
            return unsafe { revive(ptr) };
        }
        let data: ConstantData<'static> = ConstantData {
            base: ValueBase::new(unsafe { revive(key.ty) }, None),
            kind: crate::consts::ConstantKind::Int(value),
        };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.int_const_cache.borrow_mut().insert(key, addr);
        self.all_constants.borrow_mut().push(addr);
        unsafe { revive(addr) }
    }

    pub fn const_i1(&self, value: bool) -> &'_ ConstantData<'_> {
        unsafe { revive(if value { self.singletons.i1_true } else { self.singletons.i1_false }) }
    }

    /// Returns `None` for NaN, which is not representable as a uniqued
    /// constant key.
    pub fn const_float(&self, ty: Ty<'_>, value: f64) -> Option<&'_ ConstantData<'_>> {
        let bits = FloatKey::new(value)?;
        let key = FloatConstKey { ty: addr_of(ty), bits };
        if let Some(&ptr) = self.float_const_cache.borrow().get(&key) {
            return Some(unsafe { revive(ptr) });
        }
        let data: ConstantData<'static> = ConstantData {
            base: ValueBase::new(unsafe { revive(key.ty) }, None),
            kind: crate::consts::ConstantKind::Float(bits.value()),
        };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.float_const_cache.borrow_mut().insert(key, addr);
        self.all_constants.borrow_mut().push(addr);
        Some(unsafe { revive(addr) })
    }

    pub fn const_undef(&self, ty: Ty<'_>) -> &'_ ConstantData<'_> {
        let key = UndefKey { ty: addr_of(ty) };
        if let Some(&ptr) = self.undef_cache.borrow().get(&key) {
            return unsafe { revive(ptr) };
        }
        let data: ConstantData<'static> =
            ConstantData { base: ValueBase::new(unsafe { revive(key.ty) }, None), kind: crate::consts::ConstantKind::Undef };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.undef_cache.borrow_mut().insert(key, addr);
        self.all_constants.borrow_mut().push(addr);
        unsafe { revive(addr) }
    }

    pub fn const_zeroinitializer(&self, ty: Ty<'_>) -> &'_ ConstantData<'_> {
        let key = ZeroKey { ty: addr_of(ty) };
        if let Some(&ptr) = self.zero_cache.borrow().get(&key) {
            return unsafe { revive(ptr) };
        }
        let data: ConstantData<'static> = ConstantData {
            base: ValueBase::new(unsafe { revive(key.ty) }, None),
            kind: crate::consts::ConstantKind::ZeroInitializer,
        };
        let allocated = self.permanent.alloc(data).expect("permanent arena OOM");
        let addr = addr_of(allocated);
        self.zero_cache.borrow_mut().insert(key, addr);
        self.all_constants.borrow_mut().push(addr);
        unsafe { revive(addr) }
    }

    // ---- string interning ---------------------------------------------------

    /// Intern `s`. A miss copies `s` into the permanent arena (nul-terminated
    /// for C-string consumers) and records its address; a hit returns the
    /// arena pointer from the first call, so two calls with equal content
    /// always return the same pointer.
    pub fn intern_str(&self, s: &str) -> &'_ str {
        if let Some(&ptr) = self.string_cache.borrow().get(&s.to_string()) {
            // SAFETY: `ptr` was produced below by `self.permanent.alloc_str`,
            // and the cached entry has the same length as `s` (equal keys).
            let interned: &str =
                unsafe { std::str::from_utf8_unchecked(std::slice::from_raw_parts(ptr as *const u8, s.len())) };
            return interned;
        }
        let copied = self.permanent.alloc_str(s).expect("permanent arena OOM");
        let addr = copied as *const str as *const u8 as usize;
        let len = copied.len();
        self.string_cache.borrow_mut().insert(s.to_string(), addr);
        // SAFETY: `addr`/`len` describe the bytes just written by `alloc_str`.
        unsafe { std::str::from_utf8_unchecked(std::slice::from_raw_parts(addr as *const u8, len)) }
    }

    // ---- IR construction -----------------------------------------------------

    pub fn ir_arena(&self) -> &Arena {
        &self.ir
    }

    pub fn create_module(&self, name: &str) -> crate::error::Result<&'_ crate::module::Module<'_>> {
        let interned = self.intern_str(name);
        Ok(self.ir.alloc(crate::module::Module::new(interned))?)
    }

    /// Declare a function: mints the value but installs no signature or
    /// blocks yet (see `Function::finalize_signature`). `name` is interned
    /// so its `&str` outlives any particular `Module`.
    pub fn create_function(&self, name: &str) -> crate::error::Result<&'_ crate::function::Function<'_>> {
        let interned = self.intern_str(name);
        let void = self.get_void();
        let base = ValueBase::new(void, Some(interned));
        Ok(self.ir.alloc(crate::function::Function::new(base))?)
    }

    pub fn create_block(&self, name: Option<&str>) -> crate::error::Result<&'_ crate::block::BasicBlock<'_>> {
        let interned = name.map(|n| self.intern_str(n));
        let label = self.get_label();
        let base = ValueBase::new(label, interned);
        Ok(self.ir.alloc(crate::block::BasicBlock::new(base))?)
    }

    pub fn create_argument<'a>(
        &'a self,
        ty: Ty<'a>,
        name: Option<&str>,
        index: usize,
    ) -> crate::error::Result<&'a crate::function::Argument<'a>> {
        let interned = name.map(|n| self.intern_str(n));
        let base = ValueBase::new(ty, interned);
        Ok(self.ir.alloc(crate::function::Argument { base, index })?)
    }

    /// Reset the IR arena, invalidating every `Module`, `Function`,
    /// `BasicBlock`, `Instruction`, and `Use` built since the last reset.
    /// Types, constants, and interned strings are unaffected. Constants'
    /// uses lists are cleared first since the `Use`s they pointed at are
    /// about to become invalid along with the rest of the IR arena.
    pub fn reset_ir(&mut self) {
        for &addr in self.all_constants.borrow().iter() {
            let data: &ConstantData<'_> = unsafe { revive(addr) };
            data.base.clear_uses();
        }
        self.ir.reset();
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconstruct a `&'s [T]` from a slice that was allocated by
/// `self.permanent.alloc_slice_copy` and will live for the caller's chosen
/// `'s` — sound for the same reason [`revive`] is.
unsafe fn revive_slice<'s, T>(slice: &mut [T]) -> &'s [T] {
    std::slice::from_raw_parts(slice.as_ptr(), slice.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_singletons_are_pointer_equal_across_calls() {
        let ctx = Context::new();
        let a = ctx.get_i32();
        let b = ctx.get_i32();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn pointer_types_are_uniqued() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let p1 = ctx.get_ptr(i32_ty);
        let p2 = ctx.get_ptr(i32_ty);
        assert!(std::ptr::eq(p1, p2));
    }

    #[test]
    fn array_types_key_on_element_and_count() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let i8_ty = ctx.get_i8();
        let a = ctx.get_array(i32_ty, 4);
        let b = ctx.get_array(i32_ty, 4);
        let c = ctx.get_array(i32_ty, 5);
        let d = ctx.get_array(i8_ty, 4);
        assert!(std::ptr::eq(a, b));
        assert!(!std::ptr::eq(a, c));
        assert!(!std::ptr::eq(a, d));
    }

    #[test]
    fn anonymous_structs_are_uniqued_by_member_sequence() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let i8_ty = ctx.get_i8();
        let s1 = ctx.get_anon_struct(&[i32_ty, i8_ty]);
        let s2 = ctx.get_anon_struct(&[i32_ty, i8_ty]);
        let s3 = ctx.get_anon_struct(&[i8_ty, i32_ty]);
        assert!(std::ptr::eq(s1, s2));
        assert!(!std::ptr::eq(s1, s3));
    }

    #[test]
    fn named_structs_are_uniqued_by_name() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let s1 = ctx.get_named_struct("my_struct", &[i32_ty, i32_ty]);
        let s2 = ctx.lookup_named_struct("my_struct").unwrap();
        assert!(std::ptr::eq(s1, s2));
    }

    #[test]
    fn function_types_key_on_signature() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let f1 = ctx.get_function_type(i32_ty, &[i32_ty, i32_ty], false);
        let f2 = ctx.get_function_type(i32_ty, &[i32_ty, i32_ty], false);
        let f3 = ctx.get_function_type(i32_ty, &[i32_ty], false);
        assert!(std::ptr::eq(f1, f2));
        assert!(!std::ptr::eq(f1, f3));
    }

    #[test]
    fn integer_constants_are_uniqued_per_width_and_value() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let i64_ty = ctx.get_i64();
        let a = ctx.const_int(i32_ty, 42);
        let b = ctx.const_int(i32_ty, 42);
        let c = ctx.const_int(i64_ty, 42);
        assert!(std::ptr::eq(a, b));
        assert!(!std::ptr::eq(a, c));
    }

    #[test]
    fn i1_true_false_are_singletons() {
        let ctx = Context::new();
        assert!(std::ptr::eq(ctx.const_i1(true), ctx.const_i1(true)));
        assert!(!std::ptr::eq(ctx.const_i1(true), ctx.const_i1(false)));
    }

    #[test]
    fn float_constants_reject_nan_and_unify_zero() {
        let ctx = Context::new();
        let f64_ty = ctx.get_f64();
        assert!(ctx.const_float(f64_ty, f64::NAN).is_none());
        let pos = ctx.const_float(f64_ty, 0.0).unwrap();
        let neg = ctx.const_float(f64_ty, -0.0).unwrap();
        assert!(std::ptr::eq(pos, neg));
    }

    #[test]
    fn string_interning_is_content_addressed() {
        let ctx = Context::new();
        let a = ctx.intern_str("hello");
        let b = ctx.intern_str("hello");
        assert!(std::ptr::eq(a, b));
        assert_eq!(a, "hello");
    }

    #[test]
    fn reset_ir_preserves_type_identity() {
        let mut ctx = Context::new();
        let before = ctx.get_i32() as *const _ as usize;
        {
            let _m = ctx.create_module("m1").unwrap();
        }
        ctx.reset_ir();
        let after = ctx.get_i32() as *const _ as usize;
        assert_eq!(before, after);
    }

    #[test]
    fn reset_ir_clears_constant_uses_lists() {
        use crate::instr::{InstrExtra, Instruction, Opcode};
        use crate::value::{Use, ValueRef};

        let mut ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let const_addr = ctx.const_int(i32_ty, 42) as *const ConstantData<'_> as usize;

        // Wire up a throwaway `ret 42` instruction that uses the constant,
        // all within a scope so the borrow of `ctx` ends before `reset_ir`.
        {
            let instr = ctx
                .ir
                .alloc(Instruction::new(ValueBase::new(ctx.get_void(), None), Opcode::Ret, InstrExtra::None))
                .unwrap();
            let instr: &Instruction<'_> = instr;
            let constant: &ConstantData<'_> = unsafe { revive(const_addr) };
            let u = Use::create(&ctx.ir, instr, 0, ValueRef::Constant(constant)).unwrap();
            instr.push_operand(u);
        }
        let before: &ConstantData<'_> = unsafe { revive(const_addr) };
        assert!(before.base.has_uses());

        ctx.reset_ir();

        let after: &ConstantData<'_> = unsafe { revive(const_addr) };
        assert!(!after.base.has_uses());
    }
}
