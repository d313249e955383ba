use simtlower_dtype::ScalarDType;
use simtlower_ir::{Builder, OpId, RtValue, Value};
use simtlower_layout::{Layout, LlvmTypeConverter, TensorType, Type, TypeConverter};

use crate::Operation;

pub mod dedup;

pub(crate) fn tensor(shape: &[usize], element: ScalarDType, layout: Layout) -> Type {
    TensorType::new(shape, element, layout).unwrap().into()
}

/// One lane owning `n` consecutive elements of a 1-D tensor of `n`.
pub(crate) fn blocked_1d(n: usize, element: ScalarDType) -> Type {
    tensor(&[n], element, Layout::blocked(&[n], &[1], &[1], &[0]))
}

/// Pure elementwise op with the given types.
pub(crate) fn pure_op(id: u32, operands: &[Type], result: Type) -> Operation {
    Operation::builder()
        .id(OpId(id))
        .name("elementwise")
        .operand_types(operands.to_vec())
        .result_types(vec![result])
        .build()
}

/// Lowered argument `index` of type `ty`.
pub(crate) fn lowered_arg(b: &mut Builder, index: usize, ty: &Type) -> Value {
    b.arg(index, LlvmTypeConverter.convert(ty).unwrap())
}

/// The same aggregate on each of `warp` lanes.
pub(crate) fn splat_aggregate(fields: Vec<RtValue>, warp: usize) -> Vec<RtValue> {
    vec![RtValue::Aggregate(fields); warp]
}

pub(crate) fn ints(values: impl IntoIterator<Item = i64>, scalar: ScalarDType) -> Vec<RtValue> {
    values.into_iter().map(|v| RtValue::int(v, scalar)).collect()
}
