//! Elementwise lowering of distributed tensor operations.
//!
//! A tensor value lowered for one lane is an aggregate of registers. The
//! engine in [`elementwise`] unpacks every operand aggregate into its
//! per-lane scalars, hands positional operand groups to a rule that emits
//! the scalar computation, reuses results the axis analysis proves equal,
//! and repacks the results into the aggregate of the result type.
//!
//! - [`packing`] - aggregate <-> scalar sequence, including sub-word packing
//! - [`elementwise`] - the engine and deduplication
//! - [`rules`] - concrete scalar rules
//! - [`axis`] - the constancy analysis seam

pub mod axis;
pub mod config;
pub mod elementwise;
pub mod error;
pub mod op;
pub mod packing;
pub mod rules;


pub use axis::{AxisAnalysis, ModuleAxisInfo};
pub use config::LoweringConfig;
pub use elementwise::{
    DestOps, ElementwiseConversion, ElementwiseLowering, OpContext, OperandGroups, dedup_indices, lowering_fn,
};
pub use error::{Error, Result};
pub use op::Operation;
pub use rules::{BinaryRule, CastRule, MaxMinRule, PackedPairRule, SelectRule};
