use simtlower_dtype::{DType, ScalarDType};

use crate::{Layout, LlvmTypeConverter, TensorType, Type, TypeConverter};

#[test]
fn test_scalar_passthrough() {
    assert_eq!(LlvmTypeConverter.convert(&Type::Scalar(ScalarDType::Float16)).unwrap(), DType::Float16);
}

#[test]
fn test_blocked_tensor_lowers_to_element_struct() {
    let ty = TensorType::new(&[256], ScalarDType::Float32, Layout::blocked(&[4], &[32], &[2], &[0])).unwrap();
    assert_eq!(LlvmTypeConverter.convert(&ty.into()).unwrap(), DType::Struct(vec![DType::Float32; 4]));
}

#[test]
fn test_packed_operand_lowers_to_i32_struct() {
    let layout = Layout::dot_operand(1, Layout::nvidia_mma(&[1, 1]), 4);
    let ty = TensorType::new(&[32, 8], ScalarDType::Int8, layout).unwrap();
    assert_eq!(LlvmTypeConverter.convert(&ty.into()).unwrap(), DType::Struct(vec![DType::Int32; 2]));
}

#[test]
fn test_conversion_is_deterministic() {
    let ty: Type = TensorType::new(&[64, 64], ScalarDType::BFloat16, Layout::nvidia_mma(&[2, 2])).unwrap().into();
    assert_eq!(LlvmTypeConverter.convert(&ty).unwrap(), LlvmTypeConverter.convert(&ty).unwrap());
}
