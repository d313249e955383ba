//! Layout descriptors.

use simtlower_dtype::ScalarDType;
use smallvec::smallvec;
use snafu::ensure;

use crate::error::*;
use crate::{Dims, ceil_div};

/// Discriminant of a [`Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum LayoutKind {
    Blocked,
    Slice,
    NvidiaMma,
    AmdMfma,
    DotOperand,
}

/// Each lane owns `size_per_thread` contiguous elements per dimension, lanes
/// and warps tile the tensor, and the tile repeats until the shape is covered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockedLayout {
    pub size_per_thread: Dims,
    pub threads_per_warp: Dims,
    pub warps_per_cta: Dims,
    /// Axes from fastest- to slowest-varying.
    pub order: Dims,
}

/// The parent layout with dimension `dim` removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceLayout {
    pub dim: usize,
    pub parent: Box<Layout>,
}

/// Accumulator layout of NVIDIA `mma.sync` (16x8 tiles, 2x2 elements per lane).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NvidiaMmaLayout {
    pub version_major: u32,
    pub warps_per_cta: Dims,
}

/// Accumulator layout of AMD MFMA instructions on 64-wide waves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AmdMfmaLayout {
    /// M/N size of one MFMA instruction (16 or 32).
    pub non_k_dim: usize,
    pub warps_per_cta: Dims,
}

/// Operand `op_idx` (0 = A, 1 = B) of a matrix multiply whose result has `parent` layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotOperandLayout {
    pub op_idx: usize,
    pub parent: Box<Layout>,
    /// Consecutive K elements held by one lane.
    pub k_width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Layout {
    Blocked(BlockedLayout),
    Slice(SliceLayout),
    NvidiaMma(NvidiaMmaLayout),
    AmdMfma(AmdMfmaLayout),
    DotOperand(DotOperandLayout),
}

const NVIDIA_WARP: usize = 32;
const AMD_WAVE: usize = 64;

impl Layout {
    pub fn blocked(
        size_per_thread: &[usize],
        threads_per_warp: &[usize],
        warps_per_cta: &[usize],
        order: &[usize],
    ) -> Self {
        Self::Blocked(BlockedLayout {
            size_per_thread: Dims::from_slice(size_per_thread),
            threads_per_warp: Dims::from_slice(threads_per_warp),
            warps_per_cta: Dims::from_slice(warps_per_cta),
            order: Dims::from_slice(order),
        })
    }

    pub fn slice(dim: usize, parent: Layout) -> Self {
        Self::Slice(SliceLayout { dim, parent: Box::new(parent) })
    }

    pub fn nvidia_mma(warps_per_cta: &[usize]) -> Self {
        Self::NvidiaMma(NvidiaMmaLayout { version_major: 2, warps_per_cta: Dims::from_slice(warps_per_cta) })
    }

    pub fn amd_mfma(non_k_dim: usize, warps_per_cta: &[usize]) -> Self {
        Self::AmdMfma(AmdMfmaLayout { non_k_dim, warps_per_cta: Dims::from_slice(warps_per_cta) })
    }

    pub fn dot_operand(op_idx: usize, parent: Layout, k_width: usize) -> Self {
        Self::DotOperand(DotOperandLayout { op_idx, parent: Box::new(parent), k_width })
    }

    pub fn kind(&self) -> LayoutKind {
        match self {
            Self::Blocked(_) => LayoutKind::Blocked,
            Self::Slice(_) => LayoutKind::Slice,
            Self::NvidiaMma(_) => LayoutKind::NvidiaMma,
            Self::AmdMfma(_) => LayoutKind::AmdMfma,
            Self::DotOperand(_) => LayoutKind::DotOperand,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Self::Blocked(b) => b.size_per_thread.len(),
            Self::Slice(s) => s.parent.rank().saturating_sub(1),
            Self::NvidiaMma(m) => m.warps_per_cta.len(),
            Self::AmdMfma(m) => m.warps_per_cta.len(),
            Self::DotOperand(d) => d.parent.rank(),
        }
    }

    /// Whether values of this layout are stored as sub-words packed into
    /// 32-bit registers. Only NVIDIA MMA operands are packed; other
    /// accelerator operand layouts keep one element per register.
    pub fn packs_sub_words(&self, element: ScalarDType) -> bool {
        let width = element.bit_width();
        matches!(self, Self::DotOperand(d) if matches!(*d.parent, Self::NvidiaMma(_))) && (8..32).contains(&width)
    }

    /// Number of lanes cooperating on one tensor (lanes per warp times warps).
    pub fn lane_count(&self) -> usize {
        match self {
            Self::Blocked(b) => {
                b.threads_per_warp.iter().product::<usize>() * b.warps_per_cta.iter().product::<usize>()
            }
            Self::Slice(s) => s.parent.lane_count(),
            Self::NvidiaMma(m) => NVIDIA_WARP * m.warps_per_cta.iter().product::<usize>(),
            Self::AmdMfma(m) => AMD_WAVE * m.warps_per_cta.iter().product::<usize>(),
            Self::DotOperand(d) => d.parent.lane_count(),
        }
    }

    pub fn size_per_thread(&self) -> Dims {
        match self {
            Self::Blocked(b) => b.size_per_thread.clone(),
            Self::Slice(s) => {
                let mut dims = s.parent.size_per_thread();
                if s.dim < dims.len() {
                    dims.remove(s.dim);
                }
                dims
            }
            Self::NvidiaMma(m) => mma_dims(m.warps_per_cta.len(), [2, 2]),
            Self::AmdMfma(m) => mma_dims(m.warps_per_cta.len(), [4, 1]),
            Self::DotOperand(d) if d.op_idx == 0 => mma_dims(d.rank(), [1, d.k_width]),
            Self::DotOperand(d) => mma_dims(d.rank(), [d.k_width, 1]),
        }
    }

    /// Axes from fastest- to slowest-varying.
    pub fn order(&self) -> Dims {
        match self {
            Self::Blocked(b) => b.order.clone(),
            Self::Slice(s) => s
                .parent
                .order()
                .into_iter()
                .filter(|&axis| axis != s.dim)
                .map(|axis| if axis > s.dim { axis - 1 } else { axis })
                .collect(),
            _ => (0..self.rank()).rev().collect(),
        }
    }

    /// Check internal consistency of the descriptor.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Blocked(b) => {
                let rank = b.size_per_thread.len();
                ensure!(
                    b.threads_per_warp.len() == rank && b.warps_per_cta.len() == rank && b.order.len() == rank,
                    InvalidLayoutSnafu { reason: "blocked layout fields disagree on rank" }
                );
                ensure!(
                    b.size_per_thread.iter().chain(&b.threads_per_warp).chain(&b.warps_per_cta).all(|&d| d > 0),
                    InvalidLayoutSnafu { reason: "blocked layout has a zero-sized dimension" }
                );
                ensure!(
                    is_permutation(&b.order),
                    InvalidLayoutSnafu { reason: format!("order {:?} is not a permutation", b.order) }
                );
                Ok(())
            }
            Self::Slice(s) => {
                s.parent.validate()?;
                ensure!(
                    s.dim < s.parent.rank(),
                    InvalidLayoutSnafu { reason: format!("slice dim {} out of parent rank {}", s.dim, s.parent.rank()) }
                );
                Ok(())
            }
            Self::NvidiaMma(m) => {
                ensure!(m.warps_per_cta.len() >= 2, InvalidLayoutSnafu { reason: "mma layout needs rank >= 2" });
                Ok(())
            }
            Self::AmdMfma(m) => {
                ensure!(m.warps_per_cta.len() >= 2, InvalidLayoutSnafu { reason: "mfma layout needs rank >= 2" });
                ensure!(
                    matches!(m.non_k_dim, 16 | 32),
                    InvalidLayoutSnafu { reason: format!("mfma instruction size {} unsupported", m.non_k_dim) }
                );
                Ok(())
            }
            Self::DotOperand(d) => {
                d.parent.validate()?;
                ensure!(d.op_idx < 2, InvalidLayoutSnafu { reason: format!("dot operand index {}", d.op_idx) });
                ensure!(d.k_width > 0, InvalidLayoutSnafu { reason: "dot operand k_width is zero" });
                Ok(())
            }
        }
    }

    /// Elements each lane owns along every dimension of `shape`.
    pub fn elems_per_thread(&self, shape: &[usize]) -> Result<Dims> {
        ensure!(self.rank() == shape.len(), RankMismatchSnafu { layout: self.rank(), tensor: shape.len() });
        match self {
            Self::Blocked(b) => Ok(shape
                .iter()
                .enumerate()
                .map(|(d, &size)| {
                    let tile = b.size_per_thread[d] * b.threads_per_warp[d] * b.warps_per_cta[d];
                    b.size_per_thread[d] * ceil_div(size, tile)
                })
                .collect()),
            Self::Slice(s) => {
                let mut padded = Dims::from_slice(shape);
                padded.insert(s.dim, 1);
                let mut elems = s.parent.elems_per_thread(&padded)?;
                elems.remove(s.dim);
                Ok(elems)
            }
            Self::NvidiaMma(m) => {
                ensure!(shape.len() >= 2, InvalidLayoutSnafu { reason: "mma layout needs rank >= 2" });
                let (r, c) = last_two(shape);
                let mut elems = leading_ones(shape.len());
                elems.push(2 * ceil_div(r, 16 * m.warps_per_cta[shape.len() - 2]));
                elems.push(2 * ceil_div(c, 8 * m.warps_per_cta[shape.len() - 1]));
                Ok(elems)
            }
            Self::AmdMfma(m) => {
                ensure!(shape.len() >= 2, InvalidLayoutSnafu { reason: "mfma layout needs rank >= 2" });
                let (r, c) = last_two(shape);
                let per_instr = m.non_k_dim * m.non_k_dim / AMD_WAVE;
                let mut elems = leading_ones(shape.len());
                elems.push(per_instr * ceil_div(r, m.non_k_dim * m.warps_per_cta[shape.len() - 2]));
                elems.push(ceil_div(c, m.non_k_dim * m.warps_per_cta[shape.len() - 1]));
                Ok(elems)
            }
            Self::DotOperand(_) => NotPerDimensionSnafu { kind: LayoutKind::DotOperand }.fail(),
        }
    }

    /// Total number of elements each lane owns.
    pub fn total_elems_per_thread(&self, shape: &[usize], element: ScalarDType) -> Result<usize> {
        match self {
            Self::DotOperand(d) => d.total_elems_per_thread(shape, element),
            _ => Ok(self.elems_per_thread(shape)?.iter().product()),
        }
    }
}

impl DotOperandLayout {
    fn rank(&self) -> usize {
        self.parent.rank()
    }

    fn total_elems_per_thread(&self, shape: &[usize], element: ScalarDType) -> Result<usize> {
        ensure!(self.rank() == shape.len(), RankMismatchSnafu { layout: self.rank(), tensor: shape.len() });
        ensure!(shape.len() >= 2, RankMismatchSnafu { layout: 2usize, tensor: shape.len() });
        let batch: usize = shape[..shape.len() - 2].iter().product();
        let (rows, cols) = last_two(shape);
        let (non_k, k) = if self.op_idx == 0 { (rows, cols) } else { (cols, rows) };
        let warp_axis = shape.len() - 2 + (self.op_idx == 1) as usize;

        let per_batch = match &*self.parent {
            Layout::NvidiaMma(m) => {
                // m16n8k{256/bits}: A holds k/2 elements per lane and tile, B holds k/4.
                let k_instr = 256 / element.bit_width().max(8);
                let (non_k_instr, per_tile) = if self.op_idx == 0 { (16, k_instr / 2) } else { (8, k_instr / 4) };
                ceil_div(non_k, non_k_instr * m.warps_per_cta[warp_axis]) * ceil_div(k, k_instr) * per_tile
            }
            Layout::AmdMfma(m) => {
                let k_per_instr = self.k_width * (AMD_WAVE / m.non_k_dim);
                ceil_div(non_k, m.non_k_dim * m.warps_per_cta[warp_axis]) * ceil_div(k, k_per_instr) * self.k_width
            }
            Layout::Blocked(_) => {
                // FMA dot: every lane walks the whole K extent for its rows/columns.
                let mut unit_shape = leading_ones(shape.len());
                unit_shape.extend([1, 1]);
                unit_shape[warp_axis] = non_k;
                self.parent.elems_per_thread(&unit_shape)?[warp_axis] * k
            }
            other => {
                return InvalidLayoutSnafu { reason: format!("dot operand of {:?} parent", other.kind()) }.fail();
            }
        };
        Ok(batch * per_batch)
    }
}

fn last_two(shape: &[usize]) -> (usize, usize) {
    (shape[shape.len() - 2], shape[shape.len() - 1])
}

fn leading_ones(rank: usize) -> Dims {
    smallvec![1; rank.saturating_sub(2)]
}

fn mma_dims(rank: usize, inner: [usize; 2]) -> Dims {
    let mut dims = leading_ones(rank);
    dims.extend(inner);
    dims
}

fn is_permutation(order: &[usize]) -> bool {
    let mut seen = vec![false; order.len()];
    order.iter().all(|&axis| axis < seen.len() && !std::mem::replace(&mut seen[axis], true))
}
