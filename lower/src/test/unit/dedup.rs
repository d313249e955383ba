use proptest::prelude::*;
use simtlower_dtype::ScalarDType;
use simtlower_ir::{Builder, OpId, Value};
use simtlower_layout::{Layout, LlvmTypeConverter, Type};
use test_case::test_case;

use super::{blocked_1d, pure_op, tensor};
use crate::{BinaryRule, ElementwiseConversion, LoweringConfig, ModuleAxisInfo, Operation, dedup_indices};

#[test_case(&[8], &[8], &[4], &[0], Some(vec![0, 0, 0, 0, 4, 4, 4, 4]); "runs_of_four")]
#[test_case(&[8], &[8], &[3], &[0], None; "non_divisible")]
#[test_case(&[8], &[8], &[1], &[0], None; "nothing_to_fold")]
#[test_case(&[8], &[4], &[8], &[0], Some(vec![0, 0, 0, 0, 4, 4, 4, 4]); "clamped_to_size_per_thread")]
#[test_case(&[8], &[4], &[6], &[0], None; "clamp_not_divisible")]
#[test_case(&[2], &[2], &[4], &[0], Some(vec![0, 0]); "constancy_wider_than_lane")]
#[test_case(&[2, 4], &[1, 4], &[1, 2], &[1, 0], Some(vec![0, 0, 2, 2, 4, 4, 6, 6]); "fast_axis_runs")]
#[test_case(&[2, 4], &[2, 4], &[2, 1], &[1, 0], Some(vec![0, 1, 2, 3, 0, 1, 2, 3]); "slow_axis_runs")]
#[test_case(&[2, 4], &[2, 4], &[2, 1], &[0, 1], Some(vec![0, 0, 2, 2, 4, 4, 6, 6]); "column_major_order")]
fn test_dedup_indices(
    elems: &[usize],
    spt: &[usize],
    constancy: &[usize],
    order: &[usize],
    expected: Option<Vec<usize>>,
) {
    assert_eq!(dedup_indices(elems, spt, constancy, order), expected);
}

#[test]
#[should_panic(expected = "rank mismatch")]
fn test_dedup_indices_rank_mismatch() {
    dedup_indices(&[8, 2], &[8], &[4, 1], &[1, 0]);
}

/// Logical coordinate along one dimension of local index `k` for a blocked
/// layout of `spt` elements per lane and `tile` elements per layout tile.
fn logical(k: usize, spt: usize, tile: usize) -> usize {
    k / spt * tile + k % spt
}

fn dims_strategy() -> impl Strategy<Value = (Vec<(usize, usize, usize, usize)>, Vec<usize>)> {
    // (size per thread, threads, reps, constancy) per dimension, all powers of two but reps.
    let dim = (0u32..4, 0u32..3, 1usize..4, 0u32..5)
        .prop_map(|(s, t, r, c)| (1usize << s, 1usize << t, r, 1usize << c));
    (1usize..=3).prop_flat_map(move |rank| {
        let order = Just((0..rank).collect::<Vec<_>>()).prop_shuffle();
        (prop::collection::vec(dim.clone(), rank), order)
    })
}

proptest! {
    /// Values constant over aligned runs of `constancy` logical elements are
    /// unchanged when replaced by their representatives.
    #[test]
    fn test_dedup_preserves_values((dims, order) in dims_strategy()) {
        let elems: Vec<usize> = dims.iter().map(|&(s, _, r, _)| s * r).collect();
        let spt: Vec<usize> = dims.iter().map(|&(s, ..)| s).collect();
        let constancy: Vec<usize> = dims.iter().map(|&(.., c)| c).collect();

        let Some(indices) = dedup_indices(&elems, &spt, &constancy, &order) else {
            prop_assert!(constancy.iter().all(|&c| c == 1));
            return Ok(());
        };
        prop_assert_eq!(indices.len(), elems.iter().product::<usize>());

        // Position -> per-dimension local index, fastest axis (order[0]) innermost.
        let local = |mut i: usize| {
            let mut coords = vec![0; elems.len()];
            for &d in &order {
                coords[d] = i % elems[d];
                i /= elems[d];
            }
            coords
        };
        let value_at = |i: usize| -> Vec<usize> {
            local(i)
                .iter()
                .enumerate()
                .map(|(d, &k)| {
                    let (s, t, _, c) = dims[d];
                    logical(k, s, s * t) / c
                })
                .collect()
        };
        for (i, &rep) in indices.iter().enumerate() {
            prop_assert!(rep <= i);
            prop_assert_eq!(value_at(rep), value_at(i));
        }
    }
}

fn candidates(b: &mut Builder, n: usize) -> Vec<Value> {
    (0..n).map(|k| b.i32(k as i32)).collect()
}

fn run_dedup(op: &Operation, axis: &ModuleAxisInfo, config: LoweringConfig, len: usize) -> (Vec<Value>, Vec<Value>) {
    let mut b = Builder::new();
    let values = candidates(&mut b, len);
    let rule = BinaryRule { op: simtlower_ir::BinaryOp::Add };
    let conversion = ElementwiseConversion::new(rule, &LlvmTypeConverter, axis).with_config(config);
    (values.clone(), conversion.maybe_deduplicate(op, values))
}

fn axis_for(op: u32, constancy: &[usize]) -> ModuleAxisInfo {
    ModuleAxisInfo::new().with_constancy(OpId(op), constancy)
}

#[test]
fn test_eligible_op_is_deduplicated() {
    let ty = blocked_1d(8, ScalarDType::Int32);
    let op = pure_op(1, &[ty.clone(), ty.clone()], ty);
    let (values, dedup) = run_dedup(&op, &axis_for(1, &[4]), LoweringConfig::default(), 8);
    let expected: Vec<_> = [0, 0, 0, 0, 4, 4, 4, 4].iter().map(|&i| values[i]).collect();
    assert_eq!(dedup, expected);
}

#[test]
fn test_slice_layout_is_deduplicated() {
    let parent = Layout::blocked(&[8, 1], &[1, 32], &[1, 1], &[0, 1]);
    let ty = tensor(&[8], ScalarDType::Float32, Layout::slice(1, parent));
    let op = pure_op(1, &[ty.clone()], ty);
    let (values, dedup) = run_dedup(&op, &axis_for(1, &[2]), LoweringConfig::default(), 8);
    let expected: Vec<_> = [0, 0, 2, 2, 4, 4, 6, 6].iter().map(|&i| values[i]).collect();
    assert_eq!(dedup, expected);
}

fn blocked_op(id: u32) -> Operation {
    let ty = blocked_1d(8, ScalarDType::Int32);
    pure_op(id, &[ty.clone()], ty)
}

#[test_case(Operation { memory_effect_free: false, ..blocked_op(1) }, 8; "side_effects")]
#[test_case(Operation { result_types: vec![], ..blocked_op(1) }, 8; "no_results")]
#[test_case(Operation { result_types: vec![blocked_1d(8, ScalarDType::Int32); 2], ..blocked_op(1) }, 8; "two_results")]
#[test_case(Operation { result_types: vec![Type::Scalar(ScalarDType::Int32)], ..blocked_op(1) }, 1; "scalar_result")]
#[test_case(
    Operation {
        result_types: vec![tensor(&[16, 8], ScalarDType::Float32, Layout::nvidia_mma(&[1, 1]))],
        ..blocked_op(1)
    },
    4;
    "mma_layout"
)]
#[test_case(blocked_op(2), 8; "no_axis_info")]
#[test_case(blocked_op(1), 7; "length_differs_from_layout")]
fn test_gate_skips(op: Operation, len: usize) {
    let (values, dedup) = run_dedup(&op, &axis_for(1, &[4]), LoweringConfig::default(), len);
    assert_eq!(dedup, values);
}

#[test_case(&[1]; "constancy_one")]
#[test_case(&[4, 1]; "constancy_rank")]
fn test_constancy_gates(constancy: &[usize]) {
    let (values, dedup) = run_dedup(&blocked_op(1), &axis_for(1, constancy), LoweringConfig::default(), 8);
    assert_eq!(dedup, values);
}

#[test]
fn test_disabled_by_config() {
    let config = LoweringConfig::builder().dedup(false).build();
    let (values, dedup) = run_dedup(&blocked_op(1), &axis_for(1, &[4]), config, 8);
    assert_eq!(dedup, values);
}
