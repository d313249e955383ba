//! Value handles and the instruction set.

use simtlower_dtype::DType;
use smallvec::{SmallVec, smallvec};

use crate::types::{BinaryOp, CmpPred, ConstValue, ReduceOp, ShuffleKind};

/// Handle to the result of an emitted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(u32);

impl Value {
    /// The null handle. Never defined by any builder.
    pub const INVALID: Self = Self(u32::MAX);

    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    pub const fn is_invalid(&self) -> bool {
        self.0 == u32::MAX
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_invalid() { f.write_str("%<invalid>") } else { write!(f, "%{}", self.0) }
    }
}

/// Instructions a lowering rule or target can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    Const(ConstValue),
    Undef,
    /// Index of the executing lane within its warp (i32).
    LaneId,
    /// Incoming lowered operand.
    Arg(usize),

    ExtractValue { aggregate: Value, index: usize },
    InsertValue { aggregate: Value, value: Value, index: usize },
    ExtractElement { vector: Value, index: Value },
    InsertElement { vector: Value, value: Value, index: Value },

    /// Reinterpret bits; source and result widths match.
    Bitcast(Value),
    /// Value-preserving conversion between scalar (or same-length vector) types.
    Cast(Value),

    Binary { op: BinaryOp, lhs: Value, rhs: Value },
    Cmp { pred: CmpPred, lhs: Value, rhs: Value },
    Select { cond: Value, on_true: Value, on_false: Value },
    /// Byte offset into a pointer.
    PtrAdd { ptr: Value, offset: Value },

    /// Native lane shuffle of an i32 over the full warp. A source lane outside
    /// the warp yields the executing lane's own value.
    Shuffle { kind: ShuffleKind, value: Value, lane: Value },
    /// Backward permute: read the i32 held by lane `(byte_addr / 4) mod warp_size`.
    Permute { value: Value, byte_addr: Value },
    /// Bit `i` of the result is set iff lane `i`'s predicate is true.
    Ballot(Value),
    /// Hardware warp reduction; every lane receives the combined value.
    Redux { op: ReduceOp, value: Value },

    /// Shared-memory load; yields undef when `pred` is false.
    LoadShared { ptr: Value, pred: Value },
    /// Shared-memory store; does nothing when `pred` is false.
    StoreShared { ptr: Value, value: Value, pred: Value },
}

impl Inst {
    /// Values this instruction reads, in operand order.
    pub fn operands(&self) -> SmallVec<[Value; 3]> {
        match *self {
            Self::Const(_) | Self::Undef | Self::LaneId | Self::Arg(_) => SmallVec::new(),
            Self::ExtractValue { aggregate, .. } => smallvec![aggregate],
            Self::InsertValue { aggregate, value, .. } => smallvec![aggregate, value],
            Self::ExtractElement { vector, index } => smallvec![vector, index],
            Self::InsertElement { vector, value, index } => smallvec![vector, value, index],
            Self::Bitcast(v) | Self::Cast(v) | Self::Ballot(v) => smallvec![v],
            Self::Binary { lhs, rhs, .. } | Self::Cmp { lhs, rhs, .. } => smallvec![lhs, rhs],
            Self::Select { cond, on_true, on_false } => smallvec![cond, on_true, on_false],
            Self::PtrAdd { ptr, offset } => smallvec![ptr, offset],
            Self::Shuffle { value, lane, .. } => smallvec![value, lane],
            Self::Permute { value, byte_addr } => smallvec![value, byte_addr],
            Self::Redux { value, .. } => smallvec![value],
            Self::LoadShared { ptr, pred } => smallvec![ptr, pred],
            Self::StoreShared { ptr, value, pred } => smallvec![ptr, value, pred],
        }
    }

    pub fn has_side_effects(&self) -> bool {
        matches!(self, Self::StoreShared { .. })
    }
}

/// An emitted instruction together with its result type.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub inst: Inst,
    pub dtype: DType,
}
