use simtlower_dtype::DType;
use snafu::Snafu;

use crate::{Value, types::BinaryOp};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Operand handle was not produced by this builder.
    #[snafu(display("value {value} is not defined in this builder"))]
    UndefinedValue { value: Value },

    /// Operand types of an instruction disagree.
    #[snafu(display("type mismatch: expected {expected}, got {actual}"))]
    TypeMismatch { expected: DType, actual: DType },

    /// extractvalue/insertvalue on a non-aggregate.
    #[snafu(display("{dtype} is not an aggregate"))]
    NotAnAggregate { dtype: DType },

    /// extractelement/insertelement on a non-vector.
    #[snafu(display("{dtype} is not a vector"))]
    NotAVector { dtype: DType },

    /// Aggregate or vector index out of range.
    #[snafu(display("index {index} out of bounds for {len} elements"))]
    IndexOutOfBounds { index: usize, len: usize },

    /// Bitcast between types of different widths.
    #[snafu(display("cannot bitcast {from} to {to}: widths differ"))]
    BitcastWidthMismatch { from: DType, to: DType },

    /// Binary operator applied to an unsupported type.
    #[snafu(display("invalid dtype for {op:?}: {dtype}"))]
    InvalidBinaryOperand { op: BinaryOp, dtype: DType },

    /// Condition or predicate operand is not `i1`.
    #[snafu(display("predicate must be i1, got {actual}"))]
    PredicateNotBool { actual: DType },

    /// Lane exchange instructions move exactly 32 bits.
    #[snafu(display("lane exchange requires i32, got {dtype}"))]
    NotA32BitRegister { dtype: DType },

    /// Instruction cannot be interpreted for the given operand types.
    #[snafu(display("cannot evaluate {what}"))]
    UnsupportedEval { what: String },

    /// The interpreter was not given a value for an argument.
    #[snafu(display("missing argument {index} (expected one value per lane)"))]
    MissingArgument { index: usize },

    /// Enabled shared-memory access outside the allocation.
    #[snafu(display("shared access of {bytes} bytes at {addr} is out of bounds"))]
    SharedOutOfBounds { addr: u64, bytes: usize },
}
