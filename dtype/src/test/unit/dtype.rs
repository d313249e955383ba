use proptest::prelude::*;
use strum::VariantArray;
use test_case::test_case;

use crate::{AddrSpace, DType, ScalarDType};

#[test_case(ScalarDType::Bool, 1, 1; "bool")]
#[test_case(ScalarDType::Int8, 8, 1; "int8")]
#[test_case(ScalarDType::UInt16, 16, 2; "uint16")]
#[test_case(ScalarDType::Float16, 16, 2; "float16")]
#[test_case(ScalarDType::BFloat16, 16, 2; "bfloat16")]
#[test_case(ScalarDType::Float32, 32, 4; "float32")]
#[test_case(ScalarDType::UInt64, 64, 8; "uint64")]
fn test_widths(scalar: ScalarDType, bits: usize, bytes: usize) {
    assert_eq!(scalar.bit_width(), bits);
    assert_eq!(scalar.bytes(), bytes);
}

#[test]
fn test_vec_of_one_is_scalar() {
    assert_eq!(DType::Float32.vec(1), DType::Float32);
    assert_eq!(DType::Int8.vec(4), DType::Vector { scalar: ScalarDType::Int8, count: 4 });
}

#[test]
fn test_vector_bit_width() {
    assert_eq!(DType::Int8.vec(4).bit_width(), Some(32));
    assert_eq!(DType::Float16.vec(2).bit_width(), Some(32));
    assert_eq!(DType::Struct(vec![DType::Int32]).bit_width(), None);
}

#[test]
#[should_panic(expected = "Cannot vectorize")]
fn test_vectorize_vector_panics() {
    let _ = DType::Int8.vec(4).vec(2);
}

#[test]
fn test_llvm_names() {
    assert_eq!(DType::Float16.vec(2).llvm_name(), "<2 x half>");
    assert_eq!(DType::Struct(vec![DType::Int32, DType::Float32]).llvm_name(), "{i32, float}");
    assert_eq!(DType::Float32.ptr(AddrSpace::Shared).llvm_name(), "ptr addrspace(3)");
}

proptest! {
    #[test]
    fn bits_type_preserves_width(scalar in any::<ScalarDType>()) {
        let bits = scalar.bits_type();
        prop_assert_eq!(bits.bit_width(), scalar.bit_width());
        prop_assert!(!bits.is_float());
    }

    #[test]
    fn int_and_float_are_disjoint(scalar in proptest::sample::select(ScalarDType::VARIANTS)) {
        prop_assert!(!(scalar.is_int() && scalar.is_float()));
        prop_assert_eq!(scalar.is_int(), scalar.is_signed() || scalar.is_unsigned());
    }

    #[test]
    fn every_variant_has_a_width(scalar in proptest::sample::select(ScalarDType::VARIANTS)) {
        prop_assert!(scalar.bit_width() >= 1);
        prop_assert_eq!(scalar.bytes(), scalar.bit_width().div_ceil(8));
    }
}
