//! Scalar rules for common elementwise operations.

use simtlower_ir::{BinaryOp, Builder, Value};
use simtlower_target::{TargetInfo, reduce::maximum_minimum};
use snafu::OptionExt;

use crate::elementwise::{DestOps, ElementwiseLowering, OpContext, OperandGroups};
use crate::error::*;

/// Operands of one group, checked against the rule's arity.
fn operands<const N: usize>(rule: &'static str, group: Option<&[Value]>) -> Result<[Value; N]> {
    let group = group.unwrap_or_default();
    group.try_into().ok().context(ArityMismatchSnafu { rule, expected: N, actual: group.len() })
}

/// One binary instruction per element.
#[derive(Debug, Clone, Copy)]
pub struct BinaryRule {
    pub op: BinaryOp,
}

impl ElementwiseLowering for BinaryRule {
    fn create_dest_ops(&self, b: &mut Builder, _cx: &OpContext<'_>, groups: OperandGroups<'_>) -> Result<DestOps> {
        let [lhs, rhs] = operands("binary", groups.first())?;
        Ok(DestOps::one(b.binary(self.op, lhs, rhs)?))
    }
}

/// NaN-propagating maximum or minimum, native where the target has it.
#[derive(Debug, Clone, Copy)]
pub struct MaxMinRule<'t> {
    pub target: &'t dyn TargetInfo,
    pub is_max: bool,
}

impl<'t> MaxMinRule<'t> {
    pub fn max(target: &'t dyn TargetInfo) -> Self {
        Self { target, is_max: true }
    }

    pub fn min(target: &'t dyn TargetInfo) -> Self {
        Self { target, is_max: false }
    }
}

impl ElementwiseLowering for MaxMinRule<'_> {
    fn create_dest_ops(&self, b: &mut Builder, _cx: &OpContext<'_>, groups: OperandGroups<'_>) -> Result<DestOps> {
        let [lhs, rhs] = operands(if self.is_max { "maximum" } else { "minimum" }, groups.first())?;
        Ok(DestOps::one(maximum_minimum(self.target, b, self.is_max, lhs, rhs)?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectRule;

impl ElementwiseLowering for SelectRule {
    fn create_dest_ops(&self, b: &mut Builder, _cx: &OpContext<'_>, groups: OperandGroups<'_>) -> Result<DestOps> {
        let [cond, on_true, on_false] = operands("select", groups.first())?;
        Ok(DestOps::one(b.select(cond, on_true, on_false)?))
    }
}

/// Numeric conversion to the result element type.
#[derive(Debug, Clone, Copy, Default)]
pub struct CastRule;

impl ElementwiseLowering for CastRule {
    fn create_dest_ops(&self, b: &mut Builder, cx: &OpContext<'_>, groups: OperandGroups<'_>) -> Result<DestOps> {
        let [value] = operands("cast", groups.first())?;
        Ok(DestOps::one(b.cast(value, cx.element.clone())?))
    }
}

/// Binary op on 8/16-bit integers computed two elements at a time in one
/// `<2 x iN>` instruction.
///
/// Falls back to one scalar instruction for wider types and for a trailing
/// odd element.
#[derive(Debug, Clone, Copy)]
pub struct PackedPairRule {
    pub op: BinaryOp,
}

impl PackedPairRule {
    fn pack_pair(b: &mut Builder, cx: &OpContext<'_>, pair: [Value; 2]) -> Result<Value> {
        let mut vector = b.undef(cx.element.vec(2));
        for (i, value) in pair.into_iter().enumerate() {
            vector = b.insert_element(vector, value, i)?;
        }
        Ok(vector)
    }
}

impl ElementwiseLowering for PackedPairRule {
    fn create_dest_ops(&self, b: &mut Builder, cx: &OpContext<'_>, groups: OperandGroups<'_>) -> Result<DestOps> {
        let narrow_int = cx.element.scalar().is_some_and(|s| s.is_int() && s.bit_width() < 32);
        if !narrow_int || groups.len() < 2 {
            return BinaryRule { op: self.op }.create_dest_ops(b, cx, groups);
        }

        let [lhs0, rhs0] = operands("packed pair", groups.first())?;
        let [lhs1, rhs1] = operands("packed pair", groups.get(1))?;
        let lhs = Self::pack_pair(b, cx, [lhs0, lhs1])?;
        let rhs = Self::pack_pair(b, cx, [rhs0, rhs1])?;
        let result = b.binary(self.op, lhs, rhs)?;
        let first = b.extract_element(result, 0)?;
        let second = b.extract_element(result, 1)?;
        Ok(DestOps::new([first, second], 2))
    }
}
