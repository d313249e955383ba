//! Distributed tensor types and layout descriptors.
//!
//! A layout says how the logical elements of a tensor are scattered over the
//! lanes of a SIMT processor. Everything here is a pure function of the
//! descriptor: lowering code only ever queries layouts, never mutates them.
//!
//! - [`layout`] - Layout descriptors and their per-lane queries
//! - [`tensor`] - Tensor and value types seen by lowering rules
//! - [`convert`] - The type-lowering service
//! - [`reorder`] - Value-order bijection between operand and result layouts

pub mod convert;
pub mod error;
pub mod layout;
pub mod reorder;
pub mod tensor;


pub use convert::{LlvmTypeConverter, TypeConverter};
pub use error::{Error, Result};
pub use layout::{AmdMfmaLayout, BlockedLayout, DotOperandLayout, Layout, LayoutKind, NvidiaMmaLayout, SliceLayout};
pub use reorder::reorder_values;
pub use tensor::{TensorType, Type};

/// Per-dimension sizes, fastest-varying axis not implied.
pub type Dims = smallvec::SmallVec<[usize; 4]>;

pub(crate) fn ceil_div(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}
