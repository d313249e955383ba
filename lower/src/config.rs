//! Lowering options.

use bon::bon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoweringConfig {
    /// Reuse results the axis analysis proves equal.
    pub dedup: bool,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self { dedup: true }
    }
}

#[bon]
impl LoweringConfig {
    #[builder]
    pub fn builder(#[builder(default = true)] dedup: bool) -> Self {
        Self { dedup }
    }

    /// Read configuration from the environment.
    ///
    /// # Environment Variables
    ///
    /// * `SIMTLOWER_NO_DEDUP=1` - never deduplicate results
    pub fn from_env() -> Self {
        Self { dedup: std::env::var("SIMTLOWER_NO_DEDUP").is_err() }
    }
}
