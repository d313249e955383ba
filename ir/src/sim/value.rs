use simtlower_dtype::{DType, ScalarDType};

/// Runtime value held by one lane.
///
/// Scalars (including pointers, which are byte addresses) are raw bits masked
/// to their width; their interpretation comes from the instruction's type.
#[derive(Debug, Clone, PartialEq)]
pub enum RtValue {
    Bits(u64),
    Vector(Vec<RtValue>),
    Aggregate(Vec<RtValue>),
    Undef,
    Void,
}

impl RtValue {
    /// Structured undef: vectors and aggregates keep their shape so that
    /// element insertion works on them.
    pub fn undef_of(dtype: &DType) -> Self {
        match dtype {
            DType::Vector { count, .. } => Self::Vector(vec![Self::Undef; *count]),
            DType::Struct(fields) => Self::Aggregate(fields.iter().map(Self::undef_of).collect()),
            DType::Void => Self::Void,
            _ => Self::Undef,
        }
    }

    pub fn int(value: i64, scalar: ScalarDType) -> Self {
        Self::Bits(value as u64 & mask(scalar.bit_width()))
    }

    pub fn bool(value: bool) -> Self {
        Self::Bits(value as u64)
    }

    pub fn f32(value: f32) -> Self {
        Self::Bits(value.to_bits() as u64)
    }

    pub fn f64(value: f64) -> Self {
        Self::Bits(value.to_bits())
    }

    pub fn bits(&self) -> Option<u64> {
        match self {
            Self::Bits(bits) => Some(*bits),
            _ => None,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Self::Undef)
    }

    /// Integer view honouring the signedness of `scalar`.
    pub fn to_i64(&self, scalar: ScalarDType) -> Option<i64> {
        let bits = self.bits()?;
        let width = scalar.bit_width();
        Some(if scalar.is_signed() { sign_extend(bits, width) } else { (bits & mask(width)) as i64 })
    }

    pub fn to_f64(&self, scalar: ScalarDType) -> Option<f64> {
        super::scalar::decode_float(scalar, self.bits()?).ok()
    }

    pub fn fields(&self) -> Option<&[RtValue]> {
        match self {
            Self::Aggregate(fields) | Self::Vector(fields) => Some(fields),
            _ => None,
        }
    }
}

pub(crate) const fn mask(width: usize) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

pub(crate) const fn sign_extend(bits: u64, width: usize) -> i64 {
    let shift = 64 - width as u32;
    ((bits << shift) as i64) >> shift
}

/// Concatenate a scalar or vector into raw bits, element 0 in the low bits.
pub(crate) fn flatten_bits(value: &RtValue, dtype: &DType) -> Option<u64> {
    match (value, dtype) {
        (RtValue::Bits(bits), DType::Scalar(s)) => Some(bits & mask(s.bit_width())),
        (RtValue::Bits(bits), DType::Ptr { .. }) => Some(*bits),
        (RtValue::Vector(elems), DType::Vector { scalar, .. }) => {
            let width = scalar.bit_width();
            elems.iter().enumerate().try_fold(0u64, |acc, (i, elem)| {
                Some(acc | ((elem.bits()? & mask(width)) << (i * width)))
            })
        }
        _ => None,
    }
}

/// Inverse of [`flatten_bits`].
pub(crate) fn unflatten_bits(bits: u64, dtype: &DType) -> RtValue {
    match dtype {
        DType::Scalar(s) => RtValue::Bits(bits & mask(s.bit_width())),
        DType::Vector { scalar, count } => {
            let width = scalar.bit_width();
            RtValue::Vector((0..*count).map(|i| RtValue::Bits((bits >> (i * width)) & mask(width))).collect())
        }
        DType::Ptr { .. } => RtValue::Bits(bits),
        _ => RtValue::undef_of(dtype),
    }
}
