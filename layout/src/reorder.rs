//! Value order of NVIDIA MMA operand fragments across element widths.
//!
//! A lane's fragment of an MMA operand is laid out in K-order per register.
//! When an elementwise op changes the element width (e.g. `i8 -> f16`), the
//! same logical elements land in different register slots, so the per-lane
//! sequence must be permuted before repacking.

use snafu::ensure;

use crate::error::*;
use crate::{Layout, Type};

/// Permute `values` from the order of `in_ty` into the order of `out_ty`.
///
/// Identity unless both types are NVIDIA MMA dot operands with different
/// element widths.
pub fn reorder_values<T: Copy>(values: Vec<T>, in_ty: &Type, out_ty: &Type) -> Result<Vec<T>> {
    let (Some(input), Some(output)) = (in_ty.as_tensor(), out_ty.as_tensor()) else {
        return Ok(values);
    };
    let (Layout::DotOperand(in_dot), Layout::DotOperand(out_dot)) = (&input.layout, &output.layout) else {
        return Ok(values);
    };
    debug_assert_eq!(in_dot.op_idx, out_dot.op_idx, "elementwise ops preserve the operand index");
    if !matches!(*out_dot.parent, Layout::NvidiaMma(_)) {
        return Ok(values);
    }

    let (from_bits, to_bits) = (input.element.bit_width(), output.element.bit_width());
    let pattern: &[usize] = match (from_bits, to_bits) {
        (a, b) if a == b => return Ok(values),
        (16, 32) => &[0, 1, 4, 5, 2, 3, 6, 7],
        (8, 16) => &[0, 1, 2, 3, 8, 9, 10, 11, 4, 5, 6, 7, 12, 13, 14, 15],
        _ => return UnsupportedReorderSnafu { from_bits, to_bits }.fail(),
    };

    ensure!(
        values.len() % pattern.len() == 0,
        PartialFragmentSnafu { len: values.len(), fragment: pattern.len() }
    );
    tracing::trace!(from_bits, to_bits, len = values.len(), "reordering dot operand values");
    Ok(values.chunks_exact(pattern.len()).flat_map(|chunk| pattern.iter().map(|&i| chunk[i])).collect())
}
