//! Byte-level load/store between a [`RuntimeValue`] and interpreter-owned
//! memory, and the constant-to-runtime-value conversion global
//! initializers and literal operands both go through.

use calir_ir::consts::{ConstantData, ConstantKind};
use calir_ir::types::{Ty, TypeKind};

use crate::error::{Result, RuntimeError};
use crate::value::RuntimeValue;

fn unsupported(op: &'static str, ty: &TypeKind<'_>) -> RuntimeError {
    RuntimeError::UnsupportedType { op, ty: format!("{ty:?}") }
}

/// The runtime value `constant` denotes under its own declared type.
/// `Undef`/`ZeroInitializer` carry no payload of their own — their type
/// alone says what shape to produce.
pub fn constant_to_runtime(constant: &ConstantData<'_>, ty: Ty<'_>) -> Result<RuntimeValue> {
    match constant.kind {
        ConstantKind::Int(bits) => int_value(ty, bits),
        ConstantKind::Float(v) => match &ty.kind {
            TypeKind::Float32 => Ok(RuntimeValue::F32(v as f32)),
            TypeKind::Float64 => Ok(RuntimeValue::F64(v)),
            other => Err(unsupported("float constant", other)),
        },
        ConstantKind::Undef => Ok(RuntimeValue::Undef),
        ConstantKind::ZeroInitializer => zero_value(ty),
    }
}

/// The scalar value `bits` denotes under integer type `ty`, truncated to
/// its declared width.
fn int_value(ty: Ty<'_>, bits: u64) -> Result<RuntimeValue> {
    match &ty.kind {
        TypeKind::Int(1) => Ok(RuntimeValue::I1(bits & 1 != 0)),
        TypeKind::Int(8) => Ok(RuntimeValue::I8(bits as u8)),
        TypeKind::Int(16) => Ok(RuntimeValue::I16(bits as u16)),
        TypeKind::Int(32) => Ok(RuntimeValue::I32(bits as u32)),
        TypeKind::Int(64) => Ok(RuntimeValue::I64(bits)),
        other => Err(unsupported("integer constant", other)),
    }
}

/// The all-zero runtime value for a scalar or pointer type. Also what an
/// `undef` write resolves to — see [`write_value`].
pub fn zero_value(ty: Ty<'_>) -> Result<RuntimeValue> {
    match &ty.kind {
        TypeKind::Int(1) => Ok(RuntimeValue::I1(false)),
        TypeKind::Int(8) => Ok(RuntimeValue::I8(0)),
        TypeKind::Int(16) => Ok(RuntimeValue::I16(0)),
        TypeKind::Int(32) => Ok(RuntimeValue::I32(0)),
        TypeKind::Int(64) => Ok(RuntimeValue::I64(0)),
        TypeKind::Float32 => Ok(RuntimeValue::F32(0.0)),
        TypeKind::Float64 => Ok(RuntimeValue::F64(0.0)),
        TypeKind::Ptr(_) => Ok(RuntimeValue::Pointer(0)),
        other => Err(unsupported("zeroinitializer", other)),
    }
}

/// Read a value of type `ty` out of the `size_of(ty)` bytes starting at
/// `addr`, interpreted as `ty`.
///
/// # Safety
/// `addr` must point at a live allocation at least `size_of(ty)` bytes
/// long, aligned to at least `align_of(ty)`.
pub unsafe fn read_value(ty: Ty<'_>, addr: usize) -> Result<RuntimeValue> {
    match &ty.kind {
        TypeKind::Int(1) => Ok(RuntimeValue::I1(*(addr as *const u8) != 0)),
        TypeKind::Int(8) => Ok(RuntimeValue::I8(*(addr as *const u8))),
        TypeKind::Int(16) => Ok(RuntimeValue::I16(*(addr as *const u16))),
        TypeKind::Int(32) => Ok(RuntimeValue::I32(*(addr as *const u32))),
        TypeKind::Int(64) => Ok(RuntimeValue::I64(*(addr as *const u64))),
        TypeKind::Float32 => Ok(RuntimeValue::F32(*(addr as *const f32))),
        TypeKind::Float64 => Ok(RuntimeValue::F64(*(addr as *const f64))),
        TypeKind::Ptr(_) => Ok(RuntimeValue::Pointer(*(addr as *const usize))),
        other => Err(unsupported("load", other)),
    }
}

/// Write `value`'s bytes at `addr`, sized for `ty`. An `undef` value
/// writes as zero bytes rather than leaving the destination untouched,
/// so every later `read_value` at that address is deterministic.
///
/// # Safety
/// Same contract as [`read_value`], plus the memory must be writable.
pub unsafe fn write_value(ty: Ty<'_>, addr: usize, value: RuntimeValue) -> Result<()> {
    let value = match value {
        RuntimeValue::Undef => zero_value(ty)?,
        other => other,
    };
    match (&ty.kind, value) {
        (TypeKind::Int(1), RuntimeValue::I1(b)) => *(addr as *mut u8) = b as u8,
        (TypeKind::Int(8), RuntimeValue::I8(v)) => *(addr as *mut u8) = v,
        (TypeKind::Int(16), RuntimeValue::I16(v)) => *(addr as *mut u16) = v,
        (TypeKind::Int(32), RuntimeValue::I32(v)) => *(addr as *mut u32) = v,
        (TypeKind::Int(64), RuntimeValue::I64(v)) => *(addr as *mut u64) = v,
        (TypeKind::Float32, RuntimeValue::F32(v)) => *(addr as *mut f32) = v,
        (TypeKind::Float64, RuntimeValue::F64(v)) => *(addr as *mut f64) = v,
        (TypeKind::Ptr(_), RuntimeValue::Pointer(v)) => *(addr as *mut usize) = v,
        (other, found) => {
            return Err(RuntimeError::UnsupportedType { op: "store", ty: format!("{other:?} <- {found:?}") })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calir_ir::context::Context;

    #[test]
    fn zeroinitializer_of_a_pointer_is_a_null_runtime_pointer() {
        let ctx = Context::new();
        let ptr_ty = ctx.get_ptr(ctx.get_i32());
        assert_eq!(zero_value(ptr_ty).unwrap(), RuntimeValue::Pointer(0));
    }

    #[test]
    fn int_constant_truncates_to_declared_width() {
        let ctx = Context::new();
        let i8_ty = ctx.get_i8();
        let c = ctx.const_int(i8_ty, 0x1_34);
        assert_eq!(constant_to_runtime(c, i8_ty).unwrap(), RuntimeValue::I8(0x34));
    }

    #[test]
    fn store_then_load_round_trips_through_raw_memory() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let mut buf = [0u8; 4];
        let addr = buf.as_mut_ptr() as usize;
        unsafe {
            write_value(i32_ty, addr, RuntimeValue::I32(0xdead_beef)).unwrap();
            assert_eq!(read_value(i32_ty, addr).unwrap(), RuntimeValue::I32(0xdead_beef));
        }
    }

    #[test]
    fn storing_undef_zeroes_the_destination() {
        let ctx = Context::new();
        let i32_ty = ctx.get_i32();
        let mut buf = [0xffu8; 4];
        let addr = buf.as_mut_ptr() as usize;
        unsafe {
            write_value(i32_ty, addr, RuntimeValue::Undef).unwrap();
            assert_eq!(read_value(i32_ty, addr).unwrap(), RuntimeValue::I32(0));
        }
    }
}
