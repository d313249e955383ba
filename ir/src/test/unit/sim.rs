use simtlower_dtype::{AddrSpace, DType, ScalarDType};
use test_case::test_case;

use crate::{BinaryOp, Builder, CmpPred, ConstValue, Error, ReduceOp, RtValue, ShuffleKind, WarpSim};

fn lane_ids(warp: usize) -> Vec<RtValue> {
    (0..warp).map(|l| RtValue::int(l as i64, ScalarDType::Int32)).collect()
}

#[test]
fn test_bitcast_packs_low_element_first() {
    let mut b = Builder::new();
    let mut vec = b.undef(DType::Int8.vec(4));
    for (i, byte) in [0x11, 0x22, 0x33, 0x44].into_iter().enumerate() {
        let c = b.const_(DType::Int8, ConstValue::Int(byte));
        vec = b.insert_element(vec, c, i).unwrap();
    }
    let reg = b.bitcast(vec, DType::Int32).unwrap();

    let trace = WarpSim::new(1).run(&b, &[]).unwrap();
    assert_eq!(trace.lane(reg, 0), &RtValue::Bits(0x4433_2211));
}

#[test]
fn test_bitcast_of_partially_undef_vector_is_undef() {
    let mut b = Builder::new();
    let vec = b.undef(DType::Int16.vec(2));
    let c = b.const_(DType::Int16, ConstValue::Int(1));
    let vec = b.insert_element(vec, c, 0).unwrap();
    let reg = b.bitcast(vec, DType::Int32).unwrap();

    let trace = WarpSim::new(1).run(&b, &[]).unwrap();
    assert!(trace.lane(reg, 0).is_undef());
}

#[test_case(BinaryOp::Max, f32::NAN, 1.0, None; "max_propagates_nan")]
#[test_case(BinaryOp::MaxNum, f32::NAN, 1.0, Some(1.0); "maxnum_ignores_nan")]
#[test_case(BinaryOp::Min, 2.0, f32::NAN, None; "min_propagates_nan")]
#[test_case(BinaryOp::MinNum, 2.0, f32::NAN, Some(2.0); "minnum_ignores_nan")]
#[test_case(BinaryOp::Max, -1.0, 3.0, Some(3.0); "max_ordinary")]
fn test_float_min_max(op: BinaryOp, x: f32, y: f32, expected: Option<f32>) {
    let mut b = Builder::new();
    let lhs = b.const_(DType::Float32, ConstValue::Float(x as f64));
    let rhs = b.const_(DType::Float32, ConstValue::Float(y as f64));
    let r = b.binary(op, lhs, rhs).unwrap();

    let trace = WarpSim::new(1).run(&b, &[]).unwrap();
    let got = trace.lane(r, 0).to_f64(ScalarDType::Float32).unwrap();
    match expected {
        Some(e) => assert_eq!(got, e as f64),
        None => assert!(got.is_nan()),
    }
}

#[test_case(ScalarDType::Int8, -3, 2, 2; "signed_max")]
#[test_case(ScalarDType::UInt8, 253, 2, 253; "unsigned_max")]
fn test_int_max_respects_signedness(scalar: ScalarDType, x: i64, y: i64, expected: i64) {
    let mut b = Builder::new();
    let lhs = b.const_(scalar.into(), ConstValue::Int(x));
    let rhs = b.const_(scalar.into(), ConstValue::Int(y));
    let r = b.binary(BinaryOp::Max, lhs, rhs).unwrap();

    let trace = WarpSim::new(1).run(&b, &[]).unwrap();
    assert_eq!(trace.lane(r, 0).to_i64(scalar), Some(expected));
}

#[test]
fn test_sign_extending_cast() {
    let mut b = Builder::new();
    let x = b.const_(DType::Int8, ConstValue::Int(-5));
    let wide = b.cast(x, DType::Int32).unwrap();
    let f = b.cast(x, DType::Float32).unwrap();

    let trace = WarpSim::new(1).run(&b, &[]).unwrap();
    assert_eq!(trace.lane(wide, 0).to_i64(ScalarDType::Int32), Some(-5));
    assert_eq!(trace.lane(f, 0).to_f64(ScalarDType::Float32), Some(-5.0));
}

#[test]
fn test_uno_compare() {
    let mut b = Builder::new();
    let nan = b.const_(DType::Float32, ConstValue::Float(f64::NAN));
    let one = b.const_(DType::Float32, ConstValue::Float(1.0));
    let uno = b.cmp(CmpPred::Uno, nan, one).unwrap();
    let ord = b.cmp(CmpPred::Uno, one, one).unwrap();

    let trace = WarpSim::new(1).run(&b, &[]).unwrap();
    assert_eq!(trace.lane(uno, 0), &RtValue::bool(true));
    assert_eq!(trace.lane(ord, 0), &RtValue::bool(false));
}

#[test_case(ShuffleKind::Down, 1, [1, 2, 3, 3]; "down_clamps_to_self")]
#[test_case(ShuffleKind::Up, 1, [0, 0, 1, 2]; "up_clamps_to_self")]
#[test_case(ShuffleKind::Bfly, 2, [2, 3, 0, 1]; "butterfly")]
#[test_case(ShuffleKind::Idx, 3, [3, 3, 3, 3]; "broadcast")]
fn test_shuffle(kind: ShuffleKind, n: i32, expected: [i64; 4]) {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    let lane = b.i32(n);
    let r = b.shuffle(kind, x, lane).unwrap();

    let trace = WarpSim::new(4).run(&b, &[lane_ids(4)]).unwrap();
    let got: Vec<_> = trace.lanes(r).iter().map(|v| v.to_i64(ScalarDType::Int32).unwrap()).collect();
    assert_eq!(got, expected);
}

#[test]
fn test_permute_wraps_index() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    let lane = b.lane_id();
    let five = b.i32(5);
    let src = b.binary(BinaryOp::Add, lane, five).unwrap();
    let two = b.i32(2);
    let addr = b.binary(BinaryOp::Shl, src, two).unwrap();
    let r = b.permute(x, addr).unwrap();

    let trace = WarpSim::new(4).run(&b, &[lane_ids(4)]).unwrap();
    let got: Vec<_> = trace.lanes(r).iter().map(|v| v.to_i64(ScalarDType::Int32).unwrap()).collect();
    assert_eq!(got, [1, 2, 3, 0]);
}

#[test]
fn test_ballot_sets_bit_per_true_lane() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    let two = b.i32(2);
    let pred = b.cmp(CmpPred::Ge, x, two).unwrap();
    let mask = b.ballot(pred, DType::Int64).unwrap();

    let trace = WarpSim::new(8).run(&b, &[lane_ids(8)]).unwrap();
    assert!(trace.lanes(mask).iter().all(|m| *m == RtValue::Bits(0b1111_1100)));
}

#[test]
fn test_redux_broadcasts() {
    let mut b = Builder::new();
    let x = b.arg(0, DType::Int32);
    let r = b.redux(ReduceOp::Add, x).unwrap();

    let trace = WarpSim::new(8).run(&b, &[lane_ids(8)]).unwrap();
    assert!(trace.lanes(r).iter().all(|v| *v == RtValue::Bits(28)));
}

#[test]
fn test_predicated_shared_access() {
    let mut b = Builder::new();
    let base = b.const_(DType::Int32.ptr(AddrSpace::Shared), ConstValue::UInt(0));
    let lane = b.lane_id();
    let two = b.i32(2);
    let offset = b.binary(BinaryOp::Shl, lane, two).unwrap();
    let ptr = b.ptr_add(base, offset).unwrap();
    let one = b.i32(1);
    let odd_bit = b.binary(BinaryOp::And, lane, one).unwrap();
    let zero = b.i32(0);
    let odd = b.cmp(CmpPred::Ne, odd_bit, zero).unwrap();
    let value = b.i32(-1);
    b.store_shared(ptr, value, odd).unwrap();
    let loaded = b.load_shared(ptr, DType::Int32, odd).unwrap();

    let mut sim = WarpSim::new(4).with_shared_bytes(16);
    let trace = sim.run(&b, &[]).unwrap();

    assert_eq!(&sim.shared()[0..4], &[0, 0, 0, 0]);
    assert_eq!(&sim.shared()[4..8], &[0xff; 4]);
    assert_eq!(&sim.shared()[8..12], &[0, 0, 0, 0]);
    assert!(trace.lane(loaded, 0).is_undef());
    assert_eq!(trace.lane(loaded, 1), &RtValue::Bits(0xffff_ffff));
}

#[test]
fn test_disabled_access_out_of_bounds_does_not_fault() {
    let mut b = Builder::new();
    let ptr = b.const_(DType::Int32.ptr(AddrSpace::Shared), ConstValue::UInt(1 << 20));
    let off = b.bool(false);
    let value = b.i32(3);
    b.store_shared(ptr, value, off).unwrap();
    b.load_shared(ptr, DType::Int32, off).unwrap();

    assert!(WarpSim::new(2).with_shared_bytes(4).run(&b, &[]).is_ok());

    let on = b.bool(true);
    b.load_shared(ptr, DType::Int32, on).unwrap();
    let err = WarpSim::new(2).with_shared_bytes(4).run(&b, &[]).unwrap_err();
    assert!(matches!(err, Error::SharedOutOfBounds { .. }));
}

#[test]
fn test_missing_argument() {
    let mut b = Builder::new();
    b.arg(0, DType::Int32);
    let err = WarpSim::new(4).run(&b, &[vec![RtValue::Bits(0)]]).unwrap_err();
    assert_eq!(err, Error::MissingArgument { index: 0 });
}
