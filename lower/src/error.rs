use simtlower_ir::OpId;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reasons a lowering rule does not apply to an operation.
///
/// All of these are recoverable: the host may try another rule or report
/// the operation as unsupported.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The rule produced nothing for the group at `group`.
    #[snafu(display("{op}: rule produced no results at group {group}"))]
    NoResults { op: OpId, group: usize },

    /// The rule returned a handle that is not defined in the builder.
    #[snafu(display("{op}: rule returned an invalid value at group {group}"))]
    InvalidResult { op: OpId, group: usize },

    /// The rule claims to have consumed more groups than remain, or none.
    #[snafu(display("{op}: rule consumed {consumed} of {remaining} remaining groups"))]
    InvalidConsumption { op: OpId, consumed: usize, remaining: usize },

    /// Operands unpack to a different number of per-lane values.
    #[snafu(display("{op}: operand {operand} has {actual} values, expected {expected}"))]
    OperandLengthMismatch { op: OpId, operand: usize, expected: usize, actual: usize },

    /// Lowered operand aggregates do not match the declared operands.
    #[snafu(display("{op}: {actual} lowered operands for {expected} declared operands"))]
    OperandCountMismatch { op: OpId, expected: usize, actual: usize },

    /// An operand group has the wrong number of operands for the rule.
    #[snafu(display("{rule} expects {expected} operands per group, got {actual}"))]
    ArityMismatch { rule: &'static str, expected: usize, actual: usize },

    /// Elementwise lowering needs exactly one result.
    #[snafu(display("{op}: cannot lower an operation with {count} results"))]
    ResultCount { op: OpId, count: usize },

    /// The results do not fill the lowered result aggregate.
    #[snafu(display("{len} values for a lowered aggregate of {expected}"))]
    PackLengthMismatch { len: usize, expected: usize },

    #[snafu(context(false), display("IR error: {source}"))]
    Ir { source: simtlower_ir::Error },

    #[snafu(context(false), display("layout error: {source}"))]
    Layout { source: simtlower_layout::Error },

    #[snafu(context(false), display("target error: {source}"))]
    Target { source: simtlower_target::Error },
}
