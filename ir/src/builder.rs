//! The rewrite context.
//!
//! A [`Builder`] is exclusively owned by whoever lowers one host operation. It
//! appends typed instructions, validates operand types as it goes, and records
//! which lowered value replaces each host operation's result.

use std::collections::HashMap;

use simtlower_dtype::{AddrSpace, DType, ScalarDType};
use snafu::{OptionExt, ensure};

use crate::error::*;
use crate::inst::{Inst, Node, Value};
use crate::types::{BinaryOp, CmpPred, ConstValue, OpId, ReduceOp, ShuffleKind};

#[derive(Debug, Default, Clone)]
pub struct Builder {
    nodes: Vec<Node>,
    replacements: HashMap<OpId, Value>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_defined(&self, value: Value) -> bool {
        !value.is_invalid() && value.index() < self.nodes.len()
    }

    pub fn dtype_of(&self, value: Value) -> Result<&DType> {
        self.nodes.get(value.index()).map(|n| &n.dtype).context(UndefinedValueSnafu { value })
    }

    /// Number of emitted instructions matching `pred`.
    pub fn count(&self, pred: impl Fn(&Inst) -> bool) -> usize {
        self.nodes.iter().filter(|n| pred(&n.inst)).count()
    }

    /// Append an instruction without type checking beyond operand existence.
    pub fn emit(&mut self, inst: Inst, dtype: DType) -> Result<Value> {
        for operand in inst.operands() {
            ensure!(self.is_defined(operand), UndefinedValueSnafu { value: operand });
        }
        let value = Value::new(self.nodes.len());
        self.nodes.push(Node { inst, dtype });
        Ok(value)
    }

    fn push(&mut self, inst: Inst, dtype: DType) -> Value {
        let value = Value::new(self.nodes.len());
        self.nodes.push(Node { inst, dtype });
        value
    }

    // =========================================================================
    // Result replacement
    // =========================================================================

    /// Record `value` as the lowered result of `op`.
    pub fn replace_op(&mut self, op: OpId, value: Value) -> Result<()> {
        ensure!(self.is_defined(value), UndefinedValueSnafu { value });
        self.replacements.insert(op, value);
        Ok(())
    }

    pub fn replacement(&self, op: OpId) -> Option<Value> {
        self.replacements.get(&op).copied()
    }

    /// Drop every instruction from `len` onwards, together with any
    /// replacement that refers to one of them.
    ///
    /// Returns the number of dropped instructions with side effects.
    pub fn truncate(&mut self, len: usize) -> usize {
        if len >= self.nodes.len() {
            return 0;
        }
        let effects = self.nodes[len..].iter().filter(|n| n.inst.has_side_effects()).count();
        self.nodes.truncate(len);
        self.replacements.retain(|_, v| v.index() < len);
        effects
    }

    // =========================================================================
    // Leaves
    // =========================================================================

    pub fn const_(&mut self, dtype: DType, value: ConstValue) -> Value {
        self.push(Inst::Const(value), dtype)
    }

    pub fn i32(&mut self, value: i32) -> Value {
        self.const_(DType::Int32, ConstValue::Int(value as i64))
    }

    pub fn bool(&mut self, value: bool) -> Value {
        self.const_(DType::Bool, ConstValue::Bool(value))
    }

    pub fn undef(&mut self, dtype: DType) -> Value {
        self.push(Inst::Undef, dtype)
    }

    pub fn lane_id(&mut self) -> Value {
        self.push(Inst::LaneId, DType::Int32)
    }

    pub fn arg(&mut self, index: usize, dtype: DType) -> Value {
        self.push(Inst::Arg(index), dtype)
    }

    // =========================================================================
    // Aggregates and vectors
    // =========================================================================

    pub fn extract_value(&mut self, aggregate: Value, index: usize) -> Result<Value> {
        let field = self.field_type(aggregate, index)?;
        self.emit(Inst::ExtractValue { aggregate, index }, field)
    }

    pub fn insert_value(&mut self, aggregate: Value, value: Value, index: usize) -> Result<Value> {
        let field = self.field_type(aggregate, index)?;
        self.expect_type(value, &field)?;
        let dtype = self.dtype_of(aggregate)?.clone();
        self.emit(Inst::InsertValue { aggregate, value, index }, dtype)
    }

    fn field_type(&self, aggregate: Value, index: usize) -> Result<DType> {
        let dtype = self.dtype_of(aggregate)?;
        let fields = dtype.fields().context(NotAnAggregateSnafu { dtype: dtype.clone() })?;
        fields.get(index).cloned().context(IndexOutOfBoundsSnafu { index, len: fields.len() })
    }

    pub fn extract_element(&mut self, vector: Value, index: usize) -> Result<Value> {
        let scalar = self.vector_element(vector, index)?;
        let index = self.i32(index as i32);
        self.emit(Inst::ExtractElement { vector, index }, scalar.into())
    }

    pub fn insert_element(&mut self, vector: Value, value: Value, index: usize) -> Result<Value> {
        let scalar = self.vector_element(vector, index)?;
        self.expect_type(value, &scalar.into())?;
        let dtype = self.dtype_of(vector)?.clone();
        let index = self.i32(index as i32);
        self.emit(Inst::InsertElement { vector, value, index }, dtype)
    }

    fn vector_element(&self, vector: Value, index: usize) -> Result<ScalarDType> {
        match *self.dtype_of(vector)? {
            DType::Vector { scalar, count } => {
                ensure!(index < count, IndexOutOfBoundsSnafu { index, len: count });
                Ok(scalar)
            }
            ref dtype => NotAVectorSnafu { dtype: dtype.clone() }.fail(),
        }
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    pub fn bitcast(&mut self, value: Value, dtype: DType) -> Result<Value> {
        let from = self.dtype_of(value)?;
        if *from == dtype {
            return Ok(value);
        }
        ensure!(
            from.bit_width().is_some() && from.bit_width() == dtype.bit_width(),
            BitcastWidthMismatchSnafu { from: from.clone(), to: dtype }
        );
        self.emit(Inst::Bitcast(value), dtype)
    }

    pub fn cast(&mut self, value: Value, dtype: DType) -> Result<Value> {
        let from = self.dtype_of(value)?;
        if *from == dtype {
            return Ok(value);
        }
        ensure!(
            from.base().is_some() && dtype.base().is_some() && from.count() == dtype.count(),
            TypeMismatchSnafu { expected: dtype, actual: from.clone() }
        );
        self.emit(Inst::Cast(value), dtype)
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        let dtype = self.dtype_of(lhs)?.clone();
        self.expect_type(rhs, &dtype)?;
        let supported = dtype.base().is_some_and(|s| op.supports(s));
        ensure!(supported, InvalidBinaryOperandSnafu { op, dtype });
        self.emit(Inst::Binary { op, lhs, rhs }, dtype)
    }

    pub fn cmp(&mut self, pred: CmpPred, lhs: Value, rhs: Value) -> Result<Value> {
        let dtype = self.dtype_of(lhs)?.clone();
        self.expect_type(rhs, &dtype)?;
        ensure!(dtype.scalar().is_some(), TypeMismatchSnafu { expected: DType::Int32, actual: dtype });
        self.emit(Inst::Cmp { pred, lhs, rhs }, DType::Bool)
    }

    pub fn select(&mut self, cond: Value, on_true: Value, on_false: Value) -> Result<Value> {
        self.expect_predicate(cond)?;
        let dtype = self.dtype_of(on_true)?.clone();
        self.expect_type(on_false, &dtype)?;
        self.emit(Inst::Select { cond, on_true, on_false }, dtype)
    }

    pub fn ptr_add(&mut self, ptr: Value, offset: Value) -> Result<Value> {
        let dtype = self.dtype_of(ptr)?.clone();
        ensure!(
            matches!(dtype, DType::Ptr { .. }),
            TypeMismatchSnafu { expected: DType::Int8.ptr(AddrSpace::Shared), actual: dtype }
        );
        let offset_type = self.dtype_of(offset)?;
        ensure!(offset_type.is_int(), TypeMismatchSnafu { expected: DType::Int32, actual: offset_type.clone() });
        self.emit(Inst::PtrAdd { ptr, offset }, dtype)
    }

    // =========================================================================
    // Cross-lane and memory
    // =========================================================================

    pub fn shuffle(&mut self, kind: ShuffleKind, value: Value, lane: Value) -> Result<Value> {
        self.expect_register(value)?;
        self.expect_type(lane, &DType::Int32)?;
        self.emit(Inst::Shuffle { kind, value, lane }, DType::Int32)
    }

    pub fn permute(&mut self, value: Value, byte_addr: Value) -> Result<Value> {
        self.expect_register(value)?;
        self.expect_type(byte_addr, &DType::Int32)?;
        self.emit(Inst::Permute { value, byte_addr }, DType::Int32)
    }

    /// Ballot producing a lane mask of type `mask` (i32 or i64).
    pub fn ballot(&mut self, pred: Value, mask: DType) -> Result<Value> {
        self.expect_predicate(pred)?;
        ensure!(
            mask == DType::Int32 || mask == DType::Int64,
            TypeMismatchSnafu { expected: DType::Int32, actual: mask }
        );
        self.emit(Inst::Ballot(pred), mask)
    }

    pub fn redux(&mut self, op: ReduceOp, value: Value) -> Result<Value> {
        self.expect_register(value)?;
        self.emit(Inst::Redux { op, value }, DType::Int32)
    }

    pub fn load_shared(&mut self, ptr: Value, dtype: DType, pred: Value) -> Result<Value> {
        self.expect_shared_ptr(ptr)?;
        self.expect_predicate(pred)?;
        self.emit(Inst::LoadShared { ptr, pred }, dtype)
    }

    pub fn store_shared(&mut self, ptr: Value, value: Value, pred: Value) -> Result<Value> {
        self.expect_shared_ptr(ptr)?;
        self.expect_predicate(pred)?;
        self.emit(Inst::StoreShared { ptr, value, pred }, DType::Void)
    }

    // =========================================================================
    // Checks
    // =========================================================================

    fn expect_type(&self, value: Value, expected: &DType) -> Result<()> {
        let actual = self.dtype_of(value)?;
        ensure!(actual == expected, TypeMismatchSnafu { expected: expected.clone(), actual: actual.clone() });
        Ok(())
    }

    fn expect_predicate(&self, value: Value) -> Result<()> {
        let actual = self.dtype_of(value)?;
        ensure!(actual.is_bool(), PredicateNotBoolSnafu { actual: actual.clone() });
        Ok(())
    }

    fn expect_register(&self, value: Value) -> Result<()> {
        let dtype = self.dtype_of(value)?;
        ensure!(*dtype == DType::Int32, NotA32BitRegisterSnafu { dtype: dtype.clone() });
        Ok(())
    }

    fn expect_shared_ptr(&self, ptr: Value) -> Result<()> {
        let dtype = self.dtype_of(ptr)?;
        ensure!(
            matches!(dtype, DType::Ptr { addrspace: AddrSpace::Shared, .. }),
            TypeMismatchSnafu { expected: DType::Int8.ptr(AddrSpace::Shared), actual: dtype.clone() }
        );
        Ok(())
    }
}
