//! Generic lowering of elementwise operations.
//!
//! Per operation: unpack every operand, transpose into positional operand
//! groups, let the rule emit results for a window of groups at a time,
//! reorder for the result layout, reuse results proven equal, repack.

use simtlower_dtype::DType;
use simtlower_ir::{Builder, Value};
use simtlower_layout::{Dims, LayoutKind, TypeConverter, reorder_values};
use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tracing::{debug, trace};

use crate::axis::AxisAnalysis;
use crate::config::LoweringConfig;
use crate::error::*;
use crate::op::Operation;
use crate::packing;

/// Operands of one positional element, one value per operation operand.
pub type Group = SmallVec<[Value; 3]>;

/// The groups not yet consumed, starting at the current position.
#[derive(Debug, Clone, Copy)]
pub struct OperandGroups<'a> {
    groups: &'a [Group],
}

impl<'a> OperandGroups<'a> {
    pub fn new(groups: &'a [Group]) -> Self {
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a [Value]> {
        self.groups.get(index).map(|g| g.as_slice())
    }

    pub fn first(&self) -> Option<&'a [Value]> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [Value]> + 'a {
        self.groups.iter().map(|g| g.as_slice())
    }
}

/// What a rule sees besides the groups.
#[derive(Debug, Clone, Copy)]
pub struct OpContext<'a> {
    pub op: &'a Operation,
    /// Lowered operand aggregates.
    pub operands: &'a [Value],
    /// Machine type of one result element.
    pub element: &'a DType,
}

/// Results of one rule invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestOps {
    pub values: SmallVec<[Value; 2]>,
    /// Number of groups the values were computed from.
    pub consumed: usize,
}

impl DestOps {
    pub fn new(values: impl IntoIterator<Item = Value>, consumed: usize) -> Self {
        Self { values: values.into_iter().collect(), consumed }
    }

    /// One result from one group.
    pub fn one(value: Value) -> Self {
        Self::new([value], 1)
    }
}

/// Scalar computation of one elementwise operation kind.
pub trait ElementwiseLowering {
    /// Emit the results for a prefix of `groups`, which is never empty.
    fn create_dest_ops(&self, b: &mut Builder, cx: &OpContext<'_>, groups: OperandGroups<'_>) -> Result<DestOps>;
}

impl<F> ElementwiseLowering for F
where
    F: Fn(&mut Builder, &OpContext<'_>, OperandGroups<'_>) -> Result<DestOps>,
{
    fn create_dest_ops(&self, b: &mut Builder, cx: &OpContext<'_>, groups: OperandGroups<'_>) -> Result<DestOps> {
        self(b, cx, groups)
    }
}

/// Use a closure as an [`ElementwiseLowering`], fixing its signature.
pub fn lowering_fn<F>(f: F) -> F
where
    F: Fn(&mut Builder, &OpContext<'_>, OperandGroups<'_>) -> Result<DestOps>,
{
    f
}

/// Lowers operations of one kind with `rule`.
pub struct ElementwiseConversion<'a, R> {
    rule: R,
    converter: &'a dyn TypeConverter,
    axis: &'a dyn AxisAnalysis,
    config: LoweringConfig,
}

impl<'a, R: ElementwiseLowering> ElementwiseConversion<'a, R> {
    pub fn new(rule: R, converter: &'a dyn TypeConverter, axis: &'a dyn AxisAnalysis) -> Self {
        Self { rule, converter, axis, config: LoweringConfig::default() }
    }

    pub fn with_config(mut self, config: LoweringConfig) -> Self {
        self.config = config;
        self
    }

    /// Lower `op`, whose operands are lowered to `operands`, and record the
    /// lowered result as its replacement.
    ///
    /// Errors mean the rule does not apply. The builder is then rolled back
    /// to its length on entry, so the host may try another rule.
    #[tracing::instrument(skip_all, fields(op = %op.id, name = %op.name))]
    pub fn match_and_rewrite(&self, b: &mut Builder, op: &Operation, operands: &[Value]) -> Result<Value> {
        let mark = b.len();
        let result = self.rewrite(b, op, operands);
        if let Err(error) = &result {
            let emitted = b.len() - mark;
            let effects = b.truncate(mark);
            debug!(%error, emitted, effects, "rule does not apply, rolled back");
        }
        result
    }

    fn rewrite(&self, b: &mut Builder, op: &Operation, operands: &[Value]) -> Result<Value> {
        let result_ty = op.result_type().context(ResultCountSnafu { op: op.id, count: op.result_types.len() })?;
        ensure!(
            operands.len() == op.operand_types.len(),
            OperandCountMismatchSnafu { op: op.id, expected: op.operand_types.len(), actual: operands.len() }
        );
        let element = self.converter.convert_element(result_ty.element());
        let groups = self.group_operands(b, op, operands)?;

        let cx = OpContext { op, operands, element: &element };
        let mut results = Vec::with_capacity(groups.len());
        let mut cursor = 0;
        while cursor < groups.len() {
            let remaining = groups.len() - cursor;
            let dest = self.rule.create_dest_ops(b, &cx, OperandGroups::new(&groups[cursor..]))?;
            ensure!(!dest.values.is_empty(), NoResultsSnafu { op: op.id, group: cursor });
            ensure!(dest.values.iter().all(|&v| b.is_defined(v)), InvalidResultSnafu { op: op.id, group: cursor });
            ensure!(
                (1..=remaining).contains(&dest.consumed),
                InvalidConsumptionSnafu { op: op.id, consumed: dest.consumed, remaining }
            );
            results.extend(dest.values);
            cursor += dest.consumed;
        }

        if let Some(operand_ty) = op.operand_types.first() {
            results = reorder_values(results, operand_ty, result_ty)?;
        }
        let produced = results.len();
        let results = self.maybe_deduplicate(op, results);
        let lowered = packing::pack(b, self.converter, results, result_ty)?;
        b.replace_op(op.id, lowered)?;

        debug!(groups = groups.len(), results = produced, "lowered elementwise op");
        Ok(lowered)
    }

    /// Transpose unpacked operands into positional groups.
    fn group_operands(&self, b: &mut Builder, op: &Operation, operands: &[Value]) -> Result<Vec<Group>> {
        if operands.is_empty() {
            return Ok(vec![Group::new()]);
        }

        let mut groups: Vec<Group> = Vec::new();
        for (index, (&operand, ty)) in operands.iter().zip(&op.operand_types).enumerate() {
            let values = packing::unpack(b, self.converter, operand, ty)?;
            if index == 0 {
                groups.resize(values.len(), Group::new());
            }
            ensure!(
                values.len() == groups.len(),
                OperandLengthMismatchSnafu { op: op.id, operand: index, expected: groups.len(), actual: values.len() }
            );
            for (group, value) in groups.iter_mut().zip(values) {
                group.push(value);
            }
        }
        Ok(groups)
    }

    /// Replace every result by the representative of its run of equal
    /// values, as far as the axis analysis proves them equal.
    ///
    /// Never fails: whenever a precondition does not hold the input is
    /// returned unchanged.
    pub fn maybe_deduplicate(&self, op: &Operation, values: Vec<Value>) -> Vec<Value> {
        if !self.config.dedup {
            trace!("deduplication disabled");
            return values;
        }
        let Some(indices) = self.dedup_plan(op, values.len()) else {
            return values;
        };

        let distinct = indices.iter().enumerate().filter(|&(i, &rep)| i == rep).count();
        debug!(len = values.len(), distinct, "deduplicated results");
        indices.into_iter().map(|i| values[i]).collect()
    }

    fn dedup_plan(&self, op: &Operation, len: usize) -> Option<Vec<usize>> {
        if !op.memory_effect_free {
            trace!("skip dedup: op has memory effects");
            return None;
        }
        let Some(ty) = op.result_type() else {
            trace!(results = op.result_types.len(), "skip dedup: not a single result");
            return None;
        };
        let Some(tensor) = ty.as_tensor() else {
            trace!("skip dedup: result is not a tensor");
            return None;
        };
        let kind = tensor.layout.kind();
        if !matches!(kind, LayoutKind::Blocked | LayoutKind::Slice) {
            trace!(?kind, "skip dedup: layout kind");
            return None;
        }
        let Ok(elems) = tensor.elems_per_thread() else {
            trace!("skip dedup: no per-dimension elements per thread");
            return None;
        };
        if elems.iter().product::<usize>() != len {
            trace!(?elems, len, "skip dedup: value count differs from layout");
            return None;
        }
        let Some(constancy) = self.axis.constancy(op.id) else {
            trace!("skip dedup: no axis info");
            return None;
        };
        if constancy.len() != elems.len() {
            trace!(?constancy, ?elems, "skip dedup: constancy rank");
            return None;
        }

        dedup_indices(&elems, &tensor.layout.size_per_thread(), &constancy, &tensor.layout.order())
    }
}

/// Index of the representative of every per-lane position.
///
/// `elems`, `size_per_thread` and `constancy` are per dimension, `order`
/// lists the dimensions fastest-varying first. Positions are numbered with
/// the fastest dimension innermost. A coordinate is rounded down to a
/// multiple of its dimension's constancy, after clamping constancy to
/// `size_per_thread`. Returns `None` when nothing can be folded.
///
/// # Panics
///
/// If the slices disagree on rank.
pub fn dedup_indices(
    elems: &[usize],
    size_per_thread: &[usize],
    constancy: &[usize],
    order: &[usize],
) -> Option<Vec<usize>> {
    let rank = elems.len();
    assert!(
        size_per_thread.len() == rank && constancy.len() == rank && order.len() == rank,
        "rank mismatch: elems {elems:?}, size_per_thread {size_per_thread:?}, constancy {constancy:?}, order {order:?}"
    );
    if !constancy.iter().any(|&c| c > 1) {
        trace!("skip dedup: constancy is 1 everywhere");
        return None;
    }

    let mut constancy = Dims::from_slice(constancy);
    for d in 0..rank {
        if constancy[d] > size_per_thread[d] {
            if size_per_thread[d] == 0 || constancy[d] % size_per_thread[d] != 0 {
                trace!(dim = d, "skip dedup: constancy not a multiple of size per thread");
                return None;
            }
            constancy[d] = size_per_thread[d];
        }
        let (e, c) = (elems[d], constancy[d]);
        if e == 0 || c == 0 || (e % c != 0 && c % e != 0) {
            trace!(dim = d, elems = e, constancy = c, "skip dedup: no regular stride");
            return None;
        }
    }

    let (elems, constancy): (Dims, Dims) = if rank > 1 {
        (order.iter().map(|&d| elems[d]).collect(), order.iter().map(|&d| constancy[d]).collect())
    } else {
        (Dims::from_slice(elems), constancy)
    };

    let mut strides = Dims::from_elem(1, rank);
    for d in 1..rank {
        strides[d] = strides[d - 1] * elems[d - 1];
    }

    let total: usize = elems.iter().product();
    Some(
        (0..total)
            .map(|i| {
                let mut rest = i;
                let mut index = 0;
                for d in (0..rank).rev() {
                    let coord = rest / strides[d];
                    rest %= strides[d];
                    index += coord / constancy[d] * constancy[d] * strides[d];
                }
                index
            })
            .collect(),
    )
}
