use simtlower_dtype::{AddrSpace, DType};

use crate::{BinaryOp, Builder, Error, Inst, OpId, Value};

#[test]
fn test_emit_rejects_undefined_operand() {
    let mut b = Builder::new();
    let err = b.emit(Inst::Bitcast(Value::INVALID), DType::Int32).unwrap_err();
    assert!(matches!(err, Error::UndefinedValue { .. }));
}

#[test]
fn test_extract_value_type() {
    let mut b = Builder::new();
    let agg = b.arg(0, DType::Struct(vec![DType::Int32, DType::Float32]));
    let v = b.extract_value(agg, 1).unwrap();
    assert_eq!(b.dtype_of(v).unwrap(), &DType::Float32);
}

#[test]
fn test_extract_value_out_of_bounds() {
    let mut b = Builder::new();
    let agg = b.arg(0, DType::Struct(vec![DType::Int32]));
    assert_eq!(b.extract_value(agg, 3).unwrap_err(), Error::IndexOutOfBounds { index: 3, len: 1 });
}

#[test]
fn test_extract_value_from_scalar() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    assert!(matches!(b.extract_value(x, 0), Err(Error::NotAnAggregate { .. })));
}

#[test]
fn test_bitcast_width_checked() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    assert!(b.bitcast(x, DType::Int8.vec(4)).is_ok());
    assert!(matches!(b.bitcast(x, DType::Int8.vec(2)), Err(Error::BitcastWidthMismatch { .. })));
}

#[test]
fn test_bitcast_same_type_is_identity() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    let len = b.len();
    assert_eq!(b.bitcast(x, DType::Int32).unwrap(), x);
    assert_eq!(b.len(), len);
}

#[test]
fn test_binary_requires_matching_types() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    let y = b.arg(1, DType::Float32);
    assert!(matches!(b.binary(BinaryOp::Add, x, y), Err(Error::TypeMismatch { .. })));
}

#[test]
fn test_bitwise_on_float_rejected() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Float32);
    assert!(matches!(b.binary(BinaryOp::Xor, x, x), Err(Error::InvalidBinaryOperand { .. })));
}

#[test]
fn test_shuffle_requires_i32() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Float32);
    let lane = b.i32(1);
    assert!(matches!(b.shuffle(crate::ShuffleKind::Down, x, lane), Err(Error::NotA32BitRegister { .. })));
}

#[test]
fn test_shared_access_requires_shared_pointer() {
    let mut b = Builder::new();
    let global = b.arg(0, DType::Float32.ptr(AddrSpace::Global));
    let pred = b.bool(true);
    assert!(b.load_shared(global, DType::Float32, pred).is_err());

    let shared = b.arg(1, DType::Float32.ptr(AddrSpace::Shared));
    assert!(b.load_shared(shared, DType::Float32, pred).is_ok());
}

#[test]
fn test_replace_op() {
    let mut b = Builder::new();
    let x = b.i32(7);
    b.replace_op(OpId(3), x).unwrap();
    assert_eq!(b.replacement(OpId(3)), Some(x));
    assert_eq!(b.replacement(OpId(4)), None);
    assert!(b.replace_op(OpId(5), Value::INVALID).is_err());
}

#[test]
fn test_truncate_drops_instructions_and_replacements() {
    let mut b = Builder::new();
    let kept = b.i32(1);
    b.replace_op(OpId(1), kept).unwrap();
    let mark = b.len();

    let ptr = b.arg(0, DType::Int32.ptr(AddrSpace::Shared));
    let pred = b.bool(true);
    b.store_shared(ptr, kept, pred).unwrap();
    let dropped = b.binary(BinaryOp::Add, kept, kept).unwrap();
    b.replace_op(OpId(2), dropped).unwrap();

    assert_eq!(b.truncate(mark), 1);
    assert_eq!(b.len(), mark);
    assert_eq!(b.replacement(OpId(1)), Some(kept));
    assert_eq!(b.replacement(OpId(2)), None);
    assert!(!b.is_defined(dropped));
    assert_eq!(b.truncate(mark + 4), 0);
}
