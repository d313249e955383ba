//! The type-lowering service.

use simtlower_dtype::{DType, ScalarDType};

use crate::Type;
use crate::error::Result;

/// Maps host types to machine types. Must be deterministic: the same input
/// always lowers to the same machine type within one compilation.
pub trait TypeConverter: Send + Sync {
    fn convert_element(&self, element: ScalarDType) -> DType;

    fn convert(&self, ty: &Type) -> Result<DType>;
}

/// Lowers tensors to an aggregate of one register per owned element, or one
/// `i32` per packed group under sub-word packing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlvmTypeConverter;

impl TypeConverter for LlvmTypeConverter {
    fn convert_element(&self, element: ScalarDType) -> DType {
        DType::Scalar(element)
    }

    fn convert(&self, ty: &Type) -> Result<DType> {
        match ty {
            Type::Scalar(s) => Ok(self.convert_element(*s)),
            Type::Tensor(t) => {
                let register = match t.sub_word_factor() {
                    Some(_) => DType::Int32,
                    None => self.convert_element(t.element),
                };
                Ok(DType::Struct(vec![register; t.lowered_len()?]))
            }
        }
    }
}
