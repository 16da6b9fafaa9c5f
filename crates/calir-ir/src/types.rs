//! The type universe.
//!
//! Every `Ty<'ctx>` is a reference into `Context`'s permanent arena; two
//! types are equal iff they are the same reference (`std::ptr::eq`), never
//! by structural comparison. `Context` is the only thing that ever
//! constructs one, via its uniquing caches.

/// A canonical, arena-owned type. Equality is pointer equality — see
/// [`ty_eq`].
pub type Ty<'ctx> = &'ctx TypeData<'ctx>;

#[derive(Debug)]
pub struct TypeData<'ctx> {
    pub kind: TypeKind<'ctx>,
}

#[derive(Debug)]
pub enum TypeKind<'ctx> {
    Void,
    /// Fixed-width integer; width is always one of 1, 8, 16, 32, 64.
    Int(u32),
    Float32,
    Float64,
    Label,
    Ptr(Ty<'ctx>),
    Array(Ty<'ctx>, u64),
    Struct(StructBody<'ctx>),
    Function(FunctionSig<'ctx>),
}

#[derive(Debug)]
pub struct StructBody<'ctx> {
    pub name: Option<&'ctx str>,
    pub members: &'ctx [Ty<'ctx>],
}

#[derive(Debug)]
pub struct FunctionSig<'ctx> {
    pub ret: Ty<'ctx>,
    pub params: &'ctx [Ty<'ctx>],
    pub variadic: bool,
}

/// Canonical type equality: pointer identity, never structural comparison.
/// Two types built from equal constructor inputs are *always* the same
/// pointer (that's what `Context`'s uniquing caches guarantee), so this is
/// never a false negative for well-formed IR.
pub fn ty_eq<'ctx>(a: Ty<'ctx>, b: Ty<'ctx>) -> bool {
    std::ptr::eq(a, b)
}

impl<'ctx> TypeData<'ctx> {
    pub fn is_integer(&self) -> bool {
        matches!(self.kind, TypeKind::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind, TypeKind::Float32 | TypeKind::Float64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, TypeKind::Ptr(_))
    }

    pub fn int_width(&self) -> Option<u32> {
        match self.kind {
            TypeKind::Int(w) => Some(w),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<Ty<'ctx>> {
        match self.kind {
            TypeKind::Ptr(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSig<'ctx>> {
        match &self.kind {
            TypeKind::Function(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructBody<'ctx>> {
        match &self.kind {
            TypeKind::Struct(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<(Ty<'ctx>, u64)> {
        match self.kind {
            TypeKind::Array(elem, count) => Some((elem, count)),
            _ => None,
        }
    }
}
