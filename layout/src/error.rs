use snafu::Snafu;

use crate::LayoutKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Descriptor rank disagrees with the tensor shape.
    #[snafu(display("layout rank {layout} does not match tensor rank {tensor}"))]
    RankMismatch { layout: usize, tensor: usize },

    /// The layout has no per-dimension element count.
    #[snafu(display("{kind:?} layout has no per-dimension elements per thread"))]
    NotPerDimension { kind: LayoutKind },

    /// Malformed descriptor.
    #[snafu(display("invalid layout: {reason}"))]
    InvalidLayout { reason: String },

    /// No known value permutation between these element widths.
    #[snafu(display("cannot reorder dot operand values from {from_bits}-bit to {to_bits}-bit elements"))]
    UnsupportedReorder { from_bits: usize, to_bits: usize },

    /// Value count is not a whole number of MMA fragments.
    #[snafu(display("{len} values do not fill whole {fragment}-value MMA fragments"))]
    PartialFragment { len: usize, fragment: usize },
}
