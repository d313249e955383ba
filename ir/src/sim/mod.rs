//! Lockstep warp interpreter.
//!
//! Executes a builder's instruction stream for every lane of one warp at once,
//! which is enough to observe what lowered code computes: cross-lane
//! instructions see all lanes' operands, shared memory is a flat byte array.

mod scalar;
mod value;

pub use value::RtValue;

use simtlower_dtype::{DType, ScalarDType};
use snafu::{OptionExt, ensure};

use crate::builder::Builder;
use crate::error::*;
use crate::inst::{Inst, Value};
use crate::types::ShuffleKind;
use value::{flatten_bits, mask, sign_extend, unflatten_bits};

/// Values of every instruction on every lane, indexed `[value][lane]`.
#[derive(Debug, Clone)]
pub struct Trace {
    lanes: Vec<Vec<RtValue>>,
}

impl Trace {
    pub fn lanes(&self, value: Value) -> &[RtValue] {
        &self.lanes[value.index()]
    }

    pub fn lane(&self, value: Value, lane: usize) -> &RtValue {
        &self.lanes[value.index()][lane]
    }
}

#[derive(Debug, Clone)]
pub struct WarpSim {
    warp_size: usize,
    shared: Vec<u8>,
}

impl WarpSim {
    pub fn new(warp_size: usize) -> Self {
        Self { warp_size, shared: Vec::new() }
    }

    pub fn with_shared_bytes(mut self, bytes: usize) -> Self {
        self.shared = vec![0; bytes];
        self
    }

    pub fn warp_size(&self) -> usize {
        self.warp_size
    }

    pub fn shared(&self) -> &[u8] {
        &self.shared
    }

    pub fn shared_mut(&mut self) -> &mut [u8] {
        &mut self.shared
    }

    /// Run `builder` with `args[i][lane]` bound to `Arg(i)`.
    pub fn run(&mut self, builder: &Builder, args: &[Vec<RtValue>]) -> Result<Trace> {
        let mut trace = Trace { lanes: Vec::with_capacity(builder.len()) };
        for node in builder.nodes() {
            let lanes = self.step(builder, &trace, &node.inst, &node.dtype, args)?;
            trace.lanes.push(lanes);
        }
        tracing::trace!(instructions = builder.len(), warp_size = self.warp_size, "warp simulation finished");
        Ok(trace)
    }

    fn step(
        &mut self,
        builder: &Builder,
        trace: &Trace,
        inst: &Inst,
        dtype: &DType,
        args: &[Vec<RtValue>],
    ) -> Result<Vec<RtValue>> {
        let warp = self.warp_size;
        let operand_type = |v: Value| builder.dtype_of(v).cloned();

        match *inst {
            Inst::Const(value) => {
                let scalar = elem_type(dtype)?;
                let bits = scalar::encode_const(value, scalar)?;
                Ok(vec![RtValue::Bits(bits); warp])
            }
            Inst::Undef => Ok(vec![RtValue::undef_of(dtype); warp]),
            Inst::LaneId => Ok((0..warp).map(|l| RtValue::Bits(l as u64)).collect()),
            Inst::Arg(index) => {
                let values = args.get(index).filter(|v| v.len() == warp).context(MissingArgumentSnafu { index })?;
                Ok(values.clone())
            }

            Inst::ExtractValue { aggregate, index } => Ok(trace
                .lanes(aggregate)
                .iter()
                .map(|agg| agg.fields().and_then(|f| f.get(index)).cloned().unwrap_or(RtValue::Undef))
                .collect()),
            Inst::InsertValue { aggregate, value, index } => Ok(trace
                .lanes(aggregate)
                .iter()
                .zip(trace.lanes(value))
                .map(|(agg, v)| {
                    let mut fields = agg.fields().map(<[_]>::to_vec).unwrap_or_default();
                    if let Some(slot) = fields.get_mut(index) {
                        *slot = v.clone();
                    }
                    RtValue::Aggregate(fields)
                })
                .collect()),
            Inst::ExtractElement { vector, index } => Ok(trace
                .lanes(vector)
                .iter()
                .zip(trace.lanes(index))
                .map(|(vec, i)| {
                    let elem = i.bits().and_then(|i| vec.fields().and_then(|f| f.get(i as usize)));
                    elem.cloned().unwrap_or(RtValue::Undef)
                })
                .collect()),
            Inst::InsertElement { vector, value, index } => Ok((0..warp)
                .map(|l| {
                    let mut elems = trace.lane(vector, l).fields().map(<[_]>::to_vec).unwrap_or_default();
                    if let Some(slot) = trace.lane(index, l).bits().and_then(|i| elems.get_mut(i as usize)) {
                        *slot = trace.lane(value, l).clone();
                    }
                    RtValue::Vector(elems)
                })
                .collect()),

            Inst::Bitcast(value) => {
                let from = operand_type(value)?;
                Ok(trace
                    .lanes(value)
                    .iter()
                    .map(|v| match flatten_bits(v, &from) {
                        Some(bits) => unflatten_bits(bits, dtype),
                        None => RtValue::undef_of(dtype),
                    })
                    .collect())
            }
            Inst::Cast(value) => {
                let from = operand_type(value)?;
                let (Some(src), Some(dst)) = (from.base(), dtype.base()) else {
                    return UnsupportedEvalSnafu { what: format!("cast {from} to {dtype}") }.fail();
                };
                trace.lanes(value).iter().map(|v| map_elements(v, |bits| scalar::cast(src, dst, bits))).collect()
            }
            Inst::Binary { op, lhs, rhs } => {
                let scalar = elem_type(dtype)?;
                (0..warp)
                    .map(|l| {
                        zip_elements(trace.lane(lhs, l), trace.lane(rhs, l), |a, b| scalar::binary(op, scalar, a, b))
                    })
                    .collect()
            }
            Inst::Cmp { pred, lhs, rhs } => {
                let scalar = elem_type(&operand_type(lhs)?)?;
                (0..warp)
                    .map(|l| {
                        zip_elements(trace.lane(lhs, l), trace.lane(rhs, l), |a, b| {
                            scalar::compare(pred, scalar, a, b).map(u64::from)
                        })
                    })
                    .collect()
            }
            Inst::Select { cond, on_true, on_false } => Ok((0..warp)
                .map(|l| match trace.lane(cond, l).bits() {
                    Some(0) => trace.lane(on_false, l).clone(),
                    Some(_) => trace.lane(on_true, l).clone(),
                    None => RtValue::undef_of(dtype),
                })
                .collect()),
            Inst::PtrAdd { ptr, offset } => {
                let offset_width = elem_type(&operand_type(offset)?)?.bit_width();
                (0..warp)
                    .map(|l| {
                        zip_elements(trace.lane(ptr, l), trace.lane(offset, l), |p, o| {
                            Ok(p.wrapping_add(sign_extend(o, offset_width) as u64))
                        })
                    })
                    .collect()
            }

            Inst::Shuffle { kind, value, lane } => Ok((0..warp)
                .map(|l| {
                    let Some(n) = trace.lane(lane, l).bits().map(|n| n as usize) else {
                        return RtValue::Undef;
                    };
                    let src = match kind {
                        ShuffleKind::Down => Some(l + n),
                        ShuffleKind::Up => l.checked_sub(n),
                        ShuffleKind::Bfly => Some(l ^ n),
                        ShuffleKind::Idx => Some(n),
                    };
                    match src {
                        Some(src) if src < warp => trace.lane(value, src).clone(),
                        _ => trace.lane(value, l).clone(),
                    }
                })
                .collect()),
            Inst::Permute { value, byte_addr } => Ok((0..warp)
                .map(|l| match trace.lane(byte_addr, l).bits() {
                    Some(addr) => trace.lane(value, ((addr & mask(32)) as usize / 4) % warp).clone(),
                    None => RtValue::Undef,
                })
                .collect()),
            Inst::Ballot(pred) => {
                let width = elem_type(dtype)?.bit_width();
                let ballot = trace
                    .lanes(pred)
                    .iter()
                    .enumerate()
                    .filter(|(l, p)| *l < 64 && p.bits().is_some_and(|b| b != 0))
                    .fold(0u64, |acc, (l, _)| acc | (1 << l));
                Ok(vec![RtValue::Bits(ballot & mask(width)); warp])
            }
            Inst::Redux { op, value } => {
                let result = match trace.lanes(value).iter().map(RtValue::bits).collect::<Option<Vec<_>>>() {
                    Some(bits) => {
                        let mut acc = bits[0];
                        for b in &bits[1..] {
                            acc = scalar::binary(op.binary_op(), ScalarDType::Int32, acc, *b)?;
                        }
                        RtValue::Bits(acc)
                    }
                    None => RtValue::Undef,
                };
                Ok(vec![result; warp])
            }

            Inst::LoadShared { ptr, pred } => {
                let bytes = elem_type(dtype)?.bytes();
                ensure!(!dtype.is_vector(), UnsupportedEvalSnafu { what: format!("shared load of {dtype}") });
                (0..warp)
                    .map(|l| {
                        if trace.lane(pred, l).bits() != Some(1) {
                            return Ok(RtValue::Undef);
                        }
                        let addr = trace.lane(ptr, l).bits().context(UnsupportedEvalSnafu { what: "undef address" })?;
                        let range = self.shared_range(addr, bytes)?;
                        let bits = self.shared[range].iter().rev().fold(0u64, |acc, b| (acc << 8) | *b as u64);
                        Ok(RtValue::Bits(bits & mask(dtype.bit_width().unwrap_or(64))))
                    })
                    .collect()
            }
            Inst::StoreShared { ptr, value, pred } => {
                let value_type = operand_type(value)?;
                let bytes = elem_type(&value_type)?.bytes();
                for l in 0..warp {
                    if trace.lane(pred, l).bits() != Some(1) {
                        continue;
                    }
                    let addr = trace.lane(ptr, l).bits().context(UnsupportedEvalSnafu { what: "undef address" })?;
                    let range = self.shared_range(addr, bytes)?;
                    let bits = trace.lane(value, l).bits().unwrap_or(0);
                    for (i, byte) in self.shared[range].iter_mut().enumerate() {
                        *byte = (bits >> (8 * i)) as u8;
                    }
                }
                Ok(vec![RtValue::Void; warp])
            }
        }
    }

    fn shared_range(&self, addr: u64, bytes: usize) -> Result<std::ops::Range<usize>> {
        let start = addr as usize;
        ensure!(
            start.checked_add(bytes).is_some_and(|end| end <= self.shared.len()),
            SharedOutOfBoundsSnafu { addr, bytes }
        );
        Ok(start..start + bytes)
    }
}

fn elem_type(dtype: &DType) -> Result<ScalarDType> {
    match dtype {
        DType::Ptr { .. } => Ok(ScalarDType::UInt64),
        _ => dtype.base().context(UnsupportedEvalSnafu { what: format!("arithmetic on {dtype}") }),
    }
}

fn map_elements(value: &RtValue, f: impl Fn(u64) -> Result<u64> + Copy) -> Result<RtValue> {
    match value {
        RtValue::Bits(bits) => f(*bits).map(RtValue::Bits),
        RtValue::Vector(elems) => elems.iter().map(|e| map_elements(e, f)).collect::<Result<_>>().map(RtValue::Vector),
        _ => Ok(RtValue::Undef),
    }
}

fn zip_elements(a: &RtValue, b: &RtValue, f: impl Fn(u64, u64) -> Result<u64> + Copy) -> Result<RtValue> {
    match (a, b) {
        (RtValue::Bits(x), RtValue::Bits(y)) => f(*x, *y).map(RtValue::Bits),
        (RtValue::Vector(xs), RtValue::Vector(ys)) => {
            xs.iter().zip(ys).map(|(x, y)| zip_elements(x, y, f)).collect::<Result<_>>().map(RtValue::Vector)
        }
        _ => Ok(RtValue::Undef),
    }
}
