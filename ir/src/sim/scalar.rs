//! Scalar semantics of arithmetic, comparison and conversion instructions.

use simtlower_dtype::ScalarDType;
use snafu::ensure;

use super::value::{mask, sign_extend};
use crate::error::*;
use crate::types::{BinaryOp, CmpPred, ConstValue};

pub(crate) fn decode_float(scalar: ScalarDType, bits: u64) -> Result<f64> {
    match scalar {
        ScalarDType::Float32 => Ok(f32::from_bits(bits as u32) as f64),
        ScalarDType::Float64 => Ok(f64::from_bits(bits)),
        ScalarDType::BFloat16 => Ok(f32::from_bits((bits as u32) << 16) as f64),
        _ => UnsupportedEvalSnafu { what: format!("float arithmetic on {scalar:?}") }.fail(),
    }
}

pub(crate) fn encode_float(scalar: ScalarDType, value: f64) -> Result<u64> {
    match scalar {
        ScalarDType::Float32 => Ok((value as f32).to_bits() as u64),
        ScalarDType::Float64 => Ok(value.to_bits()),
        ScalarDType::BFloat16 => Ok(((value as f32).to_bits() >> 16) as u64),
        _ => UnsupportedEvalSnafu { what: format!("float arithmetic on {scalar:?}") }.fail(),
    }
}

pub(crate) fn encode_const(value: ConstValue, scalar: ScalarDType) -> Result<u64> {
    let m = mask(scalar.bit_width());
    if scalar.is_float() {
        let x = match value {
            ConstValue::Int(v) => v as f64,
            ConstValue::UInt(v) => v as f64,
            ConstValue::Float(v) => v,
            ConstValue::Bool(v) => v as u8 as f64,
        };
        return encode_float(scalar, x);
    }
    Ok(match value {
        ConstValue::Int(v) => v as u64 & m,
        ConstValue::UInt(v) => v & m,
        ConstValue::Float(v) => v as i64 as u64 & m,
        ConstValue::Bool(v) => v as u64,
    })
}

fn int_view(scalar: ScalarDType, bits: u64) -> i128 {
    let width = scalar.bit_width();
    if scalar.is_signed() { sign_extend(bits, width) as i128 } else { (bits & mask(width)) as i128 }
}

pub(crate) fn binary(op: BinaryOp, scalar: ScalarDType, a: u64, b: u64) -> Result<u64> {
    if scalar.is_float() {
        ensure!(!op.is_bitwise(), UnsupportedEvalSnafu { what: format!("{op:?} on {scalar:?}") });
        let (x, y) = (decode_float(scalar, a)?, decode_float(scalar, b)?);
        let r = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Max if x.is_nan() || y.is_nan() => f64::NAN,
            BinaryOp::Min if x.is_nan() || y.is_nan() => f64::NAN,
            BinaryOp::Max | BinaryOp::MaxNum => x.max(y),
            BinaryOp::Min | BinaryOp::MinNum => x.min(y),
            _ => unreachable!("bitwise ops rejected above"),
        };
        return encode_float(scalar, r);
    }

    let width = scalar.bit_width();
    let m = mask(width);
    let (a, b) = (a & m, b & m);
    let r = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::Shl if b >= width as u64 => 0,
        BinaryOp::Shl => a << b,
        BinaryOp::LShr if b >= width as u64 => 0,
        BinaryOp::LShr => a >> b,
        BinaryOp::Max | BinaryOp::MaxNum => {
            if int_view(scalar, a) >= int_view(scalar, b) { a } else { b }
        }
        BinaryOp::Min | BinaryOp::MinNum => {
            if int_view(scalar, a) <= int_view(scalar, b) { a } else { b }
        }
    };
    Ok(r & m)
}

pub(crate) fn compare(pred: CmpPred, scalar: ScalarDType, a: u64, b: u64) -> Result<bool> {
    if scalar.is_float() {
        let (x, y) = (decode_float(scalar, a)?, decode_float(scalar, b)?);
        let unordered = x.is_nan() || y.is_nan();
        return Ok(match pred {
            CmpPred::Eq => x == y,
            CmpPred::Ne => !unordered && x != y,
            CmpPred::Lt => x < y,
            CmpPred::Le => x <= y,
            CmpPred::Gt => x > y,
            CmpPred::Ge => x >= y,
            CmpPred::Uno => unordered,
        });
    }

    let (x, y) = (int_view(scalar, a), int_view(scalar, b));
    Ok(match pred {
        CmpPred::Eq => x == y,
        CmpPred::Ne => x != y,
        CmpPred::Lt => x < y,
        CmpPred::Le => x <= y,
        CmpPred::Gt => x > y,
        CmpPred::Ge => x >= y,
        CmpPred::Uno => false,
    })
}

pub(crate) fn cast(from: ScalarDType, to: ScalarDType, bits: u64) -> Result<u64> {
    let to_mask = mask(to.bit_width());
    if from.is_float() {
        let x = decode_float(from, bits)?;
        return if to.is_float() {
            encode_float(to, x)
        } else if to.is_signed() {
            Ok(x as i64 as u64 & to_mask)
        } else {
            Ok(x as u64 & to_mask)
        };
    }

    let v = int_view(from, bits);
    if to.is_float() { encode_float(to, v as f64) } else { Ok(v as u64 & to_mask) }
}
