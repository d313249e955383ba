//! Constancy facts from the host's axis analysis.

use std::collections::HashMap;

use simtlower_ir::OpId;
use simtlower_layout::Dims;

/// Read-only view of the axis analysis.
///
/// Shared by every lowering of a compilation unit; implementations must not
/// change while lowering runs.
pub trait AxisAnalysis: Send + Sync {
    /// Per-dimension length of runs of equal values in the result of `op`.
    fn constancy(&self, op: OpId) -> Option<Dims>;
}

/// Constancy facts collected for one module.
#[derive(Debug, Clone, Default)]
pub struct ModuleAxisInfo {
    constancy: HashMap<OpId, Dims>,
}

impl ModuleAxisInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_constancy(&mut self, op: OpId, constancy: &[usize]) {
        self.constancy.insert(op, Dims::from_slice(constancy));
    }

    pub fn with_constancy(mut self, op: OpId, constancy: &[usize]) -> Self {
        self.set_constancy(op, constancy);
        self
    }
}

impl AxisAnalysis for ModuleAxisInfo {
    fn constancy(&self, op: OpId) -> Option<Dims> {
        self.constancy.get(&op).cloned()
    }
}
