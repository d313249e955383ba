//! Conversion between lowered tensor aggregates and per-lane scalars.
//!
//! Sub-word elements of NVIDIA MMA operands live packed in `i32` registers,
//! `32 / bits` per register with the first element in the low bits. The
//! `*_i32` helpers convert between that form and one scalar per element.

use simtlower_dtype::DType;
use simtlower_ir::{Builder, Value};
use simtlower_layout::{Type, TypeConverter};
use snafu::ensure;

use crate::error::*;

/// Every register of a lowered aggregate, in field order. Non-aggregates
/// are a single register.
pub fn unpack_ll_elements(b: &mut Builder, aggregate: Value) -> Result<Vec<Value>> {
    let len = match b.dtype_of(aggregate)? {
        DType::Struct(fields) => fields.len(),
        _ => return Ok(vec![aggregate]),
    };
    (0..len).map(|i| Ok(b.extract_value(aggregate, i)?)).collect()
}

/// Assemble the lowered form of `ty` from its registers.
pub fn pack_ll_elements(
    b: &mut Builder,
    converter: &dyn TypeConverter,
    values: &[Value],
    ty: &Type,
) -> Result<Value> {
    let lowered = converter.convert(ty)?;
    let Some(fields) = lowered.fields() else {
        ensure!(values.len() == 1, PackLengthMismatchSnafu { len: values.len(), expected: 1usize });
        return Ok(values[0]);
    };
    ensure!(values.len() == fields.len(), PackLengthMismatchSnafu { len: values.len(), expected: fields.len() });

    let mut aggregate = b.undef(lowered.clone());
    for (i, &value) in values.iter().enumerate() {
        aggregate = b.insert_value(aggregate, value, i)?;
    }
    Ok(aggregate)
}

/// Split packed `i32` registers into their sub-word elements when `ty` is
/// sub-word packed; otherwise return `values` unchanged.
pub fn unpack_i32(
    b: &mut Builder,
    converter: &dyn TypeConverter,
    values: Vec<Value>,
    ty: &Type,
) -> Result<Vec<Value>> {
    let Some(tensor) = ty.as_tensor() else { return Ok(values) };
    let Some(factor) = tensor.sub_word_factor() else { return Ok(values) };

    let packed = converter.convert_element(tensor.element).vec(factor);
    let mut unpacked = Vec::with_capacity(values.len() * factor);
    for reg in values {
        let vector = b.bitcast(reg, packed.clone())?;
        for i in 0..factor {
            unpacked.push(b.extract_element(vector, i)?);
        }
    }
    Ok(unpacked)
}

/// Inverse of [`unpack_i32`].
///
/// # Panics
///
/// If `ty` is sub-word packed and `values` does not fill whole registers.
pub fn pack_i32(
    b: &mut Builder,
    converter: &dyn TypeConverter,
    values: Vec<Value>,
    ty: &Type,
) -> Result<Vec<Value>> {
    let Some(tensor) = ty.as_tensor() else { return Ok(values) };
    let Some(factor) = tensor.sub_word_factor() else { return Ok(values) };
    assert!(
        values.len() % factor == 0,
        "{} sub-word values do not fill whole registers of {factor}",
        values.len()
    );

    let packed = converter.convert_element(tensor.element).vec(factor);
    values
        .chunks_exact(factor)
        .map(|chunk| {
            let mut vector = b.undef(packed.clone());
            for (i, &value) in chunk.iter().enumerate() {
                vector = b.insert_element(vector, value, i)?;
            }
            Ok(b.bitcast(vector, DType::Int32)?)
        })
        .collect()
}

/// Per-lane scalars of a lowered tensor value of type `ty`.
pub fn unpack(b: &mut Builder, converter: &dyn TypeConverter, aggregate: Value, ty: &Type) -> Result<Vec<Value>> {
    let registers = unpack_ll_elements(b, aggregate)?;
    unpack_i32(b, converter, registers, ty)
}

/// Lowered value of type `ty` built from its per-lane scalars.
pub fn pack(b: &mut Builder, converter: &dyn TypeConverter, values: Vec<Value>, ty: &Type) -> Result<Value> {
    let registers = pack_i32(b, converter, values, ty)?;
    pack_ll_elements(b, converter, &registers, ty)
}
