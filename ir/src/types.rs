//! Constants, operator kinds and host operation identities.

use simtlower_dtype::ScalarDType;

/// Identity of a host operation being lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u32);

impl std::fmt::Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// Literal value of a `Const` instruction.
///
/// Encoded into bits only when interpreted, so half-precision literals can be
/// emitted even though the interpreter cannot compute with them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_nan() => f.write_str("nan"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Binary operators.
///
/// `Max`/`Min` on floats propagate NaN (LLVM `maximum`/`minimum`);
/// `MaxNum`/`MinNum` return the non-NaN operand. On integers both families
/// compare with the signedness of the element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    Max,
    Min,
    MaxNum,
    MinNum,
}

impl BinaryOp {
    pub const fn is_bitwise(&self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Xor | Self::Shl | Self::LShr)
    }

    pub fn supports(&self, scalar: ScalarDType) -> bool {
        match self {
            Self::And | Self::Or | Self::Xor => !scalar.is_float(),
            Self::Shl | Self::LShr => scalar.is_int(),
            _ => !scalar.is_bool(),
        }
    }
}

/// Comparison predicates. Float comparisons other than `Uno` are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CmpPred {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// True when either operand is NaN.
    Uno,
}

/// Associative, commutative reduction operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ReduceOp {
    Add,
    Mul,
    Max,
    Min,
    And,
    Or,
    Xor,
}

impl ReduceOp {
    /// Binary operator that combines two partial results.
    pub const fn binary_op(&self) -> BinaryOp {
        match self {
            Self::Add => BinaryOp::Add,
            Self::Mul => BinaryOp::Mul,
            Self::Max => BinaryOp::Max,
            Self::Min => BinaryOp::Min,
            Self::And => BinaryOp::And,
            Self::Or => BinaryOp::Or,
            Self::Xor => BinaryOp::Xor,
        }
    }
}

/// Lane-selection mode of a native shuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ShuffleKind {
    /// Read from `lane + n`.
    Down,
    /// Read from `lane - n`.
    Up,
    /// Read from `lane ^ n` (butterfly).
    Bfly,
    /// Read from lane `n`.
    Idx,
}
