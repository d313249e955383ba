//! Tensor and value types seen by lowering rules.

use simtlower_dtype::ScalarDType;

use crate::error::*;
use crate::{Dims, Layout};

/// Static type of a distributed tensor value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub shape: Dims,
    pub element: ScalarDType,
    pub layout: Layout,
}

impl TensorType {
    /// Build a tensor type, checking the layout descriptor against the shape.
    pub fn new(shape: &[usize], element: ScalarDType, layout: Layout) -> Result<Self> {
        layout.validate()?;
        snafu::ensure!(layout.rank() == shape.len(), RankMismatchSnafu { layout: layout.rank(), tensor: shape.len() });
        Ok(Self { shape: Dims::from_slice(shape), element, layout })
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn elems_per_thread(&self) -> Result<Dims> {
        self.layout.elems_per_thread(&self.shape)
    }

    pub fn total_elems_per_thread(&self) -> Result<usize> {
        self.layout.total_elems_per_thread(&self.shape, self.element)
    }

    /// Elements per 32-bit register when values are sub-word packed.
    pub fn sub_word_factor(&self) -> Option<usize> {
        self.layout.packs_sub_words(self.element).then(|| 32 / self.element.bit_width())
    }

    /// Number of registers in the lowered aggregate of one lane.
    pub fn lowered_len(&self) -> Result<usize> {
        let total = self.total_elems_per_thread()?;
        Ok(match self.sub_word_factor() {
            Some(factor) => total / factor,
            None => total,
        })
    }
}

/// Static type of a host operand or result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Scalar(ScalarDType),
    Tensor(TensorType),
}

impl Type {
    pub fn as_tensor(&self) -> Option<&TensorType> {
        match self {
            Self::Tensor(t) => Some(t),
            Self::Scalar(_) => None,
        }
    }

    /// Element type of tensors, the type itself for scalars.
    pub fn element(&self) -> ScalarDType {
        match self {
            Self::Scalar(s) => *s,
            Self::Tensor(t) => t.element,
        }
    }
}

impl From<TensorType> for Type {
    fn from(t: TensorType) -> Self {
        Self::Tensor(t)
    }
}

impl From<ScalarDType> for Type {
    fn from(s: ScalarDType) -> Self {
        Self::Scalar(s)
    }
}
