//! LLVM-flavoured textual dump of a builder's instruction stream.
//!
//! Used for debug logging and for eyeballing lowered code in tests; the
//! output is not meant to be parsed back.

use std::fmt::{self, Display, Formatter};

use crate::builder::Builder;
use crate::inst::{Inst, Node};

impl Display for Builder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, node) in self.nodes().iter().enumerate() {
            writeln!(f, "{}", RenderNode { index, node })?;
        }
        Ok(())
    }
}

struct RenderNode<'a> {
    index: usize,
    node: &'a Node,
}

impl Display for RenderNode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ty = &self.node.dtype;
        if !ty.is_void() {
            write!(f, "%{} = ", self.index)?;
        }
        match &self.node.inst {
            Inst::Const(value) => write!(f, "{ty} {value}"),
            Inst::Undef => write!(f, "{ty} undef"),
            Inst::LaneId => f.write_str("call i32 @lane.id()"),
            Inst::Arg(index) => write!(f, "{ty} %arg{index}"),
            Inst::ExtractValue { aggregate, index } => write!(f, "extractvalue {aggregate}, {index} : {ty}"),
            Inst::InsertValue { aggregate, value, index } => {
                write!(f, "insertvalue {ty} {aggregate}, {value}, {index}")
            }
            Inst::ExtractElement { vector, index } => write!(f, "extractelement {vector}, {index} : {ty}"),
            Inst::InsertElement { vector, value, index } => write!(f, "insertelement {ty} {vector}, {value}, {index}"),
            Inst::Bitcast(value) => write!(f, "bitcast {value} to {ty}"),
            Inst::Cast(value) => write!(f, "cast {value} to {ty}"),
            Inst::Binary { op, lhs, rhs } => write!(f, "{} {ty} {lhs}, {rhs}", op.as_ref()),
            Inst::Cmp { pred, lhs, rhs } => write!(f, "cmp {} {lhs}, {rhs}", pred.as_ref()),
            Inst::Select { cond, on_true, on_false } => write!(f, "select {cond}, {ty} {on_true}, {on_false}"),
            Inst::PtrAdd { ptr, offset } => write!(f, "getelementptr i8, {ty} {ptr}, {offset}"),
            Inst::Shuffle { kind, value, lane } => write!(f, "shfl.sync.{} i32 {value}, {lane}", kind.as_ref()),
            Inst::Permute { value, byte_addr } => write!(f, "ds.bpermute i32 {byte_addr}, {value}"),
            Inst::Ballot(pred) => write!(f, "ballot {ty} {pred}"),
            Inst::Redux { op, value } => write!(f, "redux.sync.{} i32 {value}", op.as_ref()),
            Inst::LoadShared { ptr, pred } => write!(f, "load.shared {ty} {ptr}, pred {pred}"),
            Inst::StoreShared { ptr, value, pred } => write!(f, "store.shared {value}, {ptr}, pred {pred}"),
        }
    }
}
