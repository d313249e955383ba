//! Per-lane instruction IR for SIMT lowering.
//!
//! Lowering rules never build host IR directly: they emit instructions into a
//! [`Builder`], which plays the role of the host compiler's rewrite context.
//!
//! # Module Organization
//!
//! - [`types`] - Constants, operator kinds and host operation identities
//! - [`inst`] - Value handles and the instruction set
//! - [`builder`] - The rewrite context: emission and result replacement
//! - [`render`] - LLVM-flavoured textual dump of emitted instructions
//! - [`sim`] - Lockstep warp interpreter used to check lowered code

pub mod builder;
pub mod error;
pub mod inst;
pub mod render;
pub mod sim;
pub mod types;


pub use builder::Builder;
pub use error::{Error, Result};
pub use inst::{Inst, Node, Value};
pub use sim::{RtValue, Trace, WarpSim};
pub use types::{BinaryOp, CmpPred, ConstValue, OpId, ReduceOp, ShuffleKind};

pub use simtlower_dtype::{AddrSpace, DType, ScalarDType};
