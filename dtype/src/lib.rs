//! Machine-level data types produced by type lowering.
//!
//! These are the types of per-lane values after a distributed tensor has been
//! lowered: scalars, short vectors (used for sub-word packing), the aggregate
//! that carries every element a lane owns, and pointers into device memory.


/// Address space for pointer types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddrSpace {
    /// Global/device memory.
    Global,
    /// Per-block scratchpad (shared/LDS) memory.
    Shared,
}

/// Scalar data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray)]
#[cfg_attr(any(test, feature = "proptest"), derive(proptest_derive::Arbitrary))]
pub enum ScalarDType {
    Bool,

    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,

    Float16,
    BFloat16,
    Float32,
    Float64,
}

/// Data type of a lowered value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DType {
    /// Scalar type (single value).
    Scalar(ScalarDType),

    /// Short fixed-width vector, used to view a 32-bit register as packed sub-words.
    Vector { scalar: ScalarDType, count: usize },

    /// Lowered aggregate: the ordered per-lane registers of a distributed tensor.
    Struct(Vec<DType>),

    /// Pointer type.
    Ptr { base: Box<DType>, addrspace: AddrSpace },

    /// Result type of side-effect-only instructions.
    Void,
}

impl ScalarDType {
    pub const fn bit_width(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int8 | Self::UInt8 => 8,
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => 16,
            Self::Int32 | Self::UInt32 | Self::Float32 => 32,
            Self::Int64 | Self::UInt64 | Self::Float64 => 64,
        }
    }

    /// Storage size in bytes (bool occupies a full byte).
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Bool => 1,
            _ => self.bit_width() / 8,
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }

    /// Signless integer type of the same width, used to move raw bits around.
    pub const fn bits_type(&self) -> Self {
        match self.bit_width() {
            1 => Self::Bool,
            8 => Self::Int8,
            16 => Self::Int16,
            32 => Self::Int32,
            _ => Self::Int64,
        }
    }

    pub const fn llvm_name(&self) -> &'static str {
        match self {
            Self::Bool => "i1",
            Self::Int8 | Self::UInt8 => "i8",
            Self::Int16 | Self::UInt16 => "i16",
            Self::Int32 | Self::UInt32 => "i32",
            Self::Int64 | Self::UInt64 => "i64",
            Self::Float16 => "half",
            Self::BFloat16 => "bfloat",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }
}

impl From<ScalarDType> for DType {
    fn from(scalar: ScalarDType) -> Self {
        Self::Scalar(scalar)
    }
}

impl DType {
    /// Create a vector type from this dtype.
    pub fn vec(&self, count: usize) -> Self {
        if count == 1 {
            return self.clone();
        }

        match self {
            Self::Scalar(s) => Self::Vector { scalar: *s, count },
            _ => panic!("Cannot vectorize {self:?}"),
        }
    }

    /// Create a pointer type from this dtype.
    pub fn ptr(self, addrspace: AddrSpace) -> Self {
        match self {
            Self::Ptr { .. } => panic!("Cannot make a pointer from a pointer"),
            _ => Self::Ptr { base: Box::new(self), addrspace },
        }
    }

    pub fn scalar(&self) -> Option<ScalarDType> {
        match self {
            Self::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Element type of scalars and vectors.
    pub fn base(&self) -> Option<ScalarDType> {
        match self {
            Self::Scalar(s) | Self::Vector { scalar: s, .. } => Some(*s),
            _ => None,
        }
    }

    /// Lane count of vectors (1 for everything else).
    pub fn count(&self) -> usize {
        match self {
            Self::Vector { count, .. } => *count,
            _ => 1,
        }
    }

    /// Total width in bits of scalar and vector types.
    pub fn bit_width(&self) -> Option<usize> {
        match self {
            Self::Scalar(s) => Some(s.bit_width()),
            Self::Vector { scalar, count } => Some(scalar.bit_width() * count),
            Self::Ptr { .. } => Some(64),
            _ => None,
        }
    }

    /// Fields of a lowered aggregate.
    pub fn fields(&self) -> Option<&[DType]> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.scalar(), Some(ScalarDType::Bool))
    }

    pub fn is_int(&self) -> bool {
        self.base().is_some_and(|s| s.is_int())
    }

    pub fn is_float(&self) -> bool {
        self.base().is_some_and(|s| s.is_float())
    }

    /// LLVM spelling of the type.
    pub fn llvm_name(&self) -> String {
        match self {
            Self::Scalar(s) => s.llvm_name().to_string(),
            Self::Vector { scalar, count } => format!("<{count} x {}>", scalar.llvm_name()),
            Self::Struct(fields) => {
                let fields: Vec<String> = fields.iter().map(DType::llvm_name).collect();
                format!("{{{}}}", fields.join(", "))
            }
            Self::Ptr { addrspace: AddrSpace::Global, .. } => "ptr addrspace(1)".to_string(),
            Self::Ptr { addrspace: AddrSpace::Shared, .. } => "ptr addrspace(3)".to_string(),
            Self::Void => "void".to_string(),
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.llvm_name())
    }
}

// Convenient constants for common types
#[allow(non_upper_case_globals)]
impl DType {
    pub const Bool: Self = Self::Scalar(ScalarDType::Bool);
    pub const Int8: Self = Self::Scalar(ScalarDType::Int8);
    pub const Int16: Self = Self::Scalar(ScalarDType::Int16);
    pub const Int32: Self = Self::Scalar(ScalarDType::Int32);
    pub const Int64: Self = Self::Scalar(ScalarDType::Int64);
    pub const UInt8: Self = Self::Scalar(ScalarDType::UInt8);
    pub const UInt16: Self = Self::Scalar(ScalarDType::UInt16);
    pub const UInt32: Self = Self::Scalar(ScalarDType::UInt32);
    pub const UInt64: Self = Self::Scalar(ScalarDType::UInt64);
    pub const Float16: Self = Self::Scalar(ScalarDType::Float16);
    pub const BFloat16: Self = Self::Scalar(ScalarDType::BFloat16);
    pub const Float32: Self = Self::Scalar(ScalarDType::Float32);
    pub const Float64: Self = Self::Scalar(ScalarDType::Float64);
}
