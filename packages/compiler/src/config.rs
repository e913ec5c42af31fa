//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::enums::CompatibilityMode;
use crate::template::pipeline::src::compilation::TemplateCompilationMode;

/// Upper bound on the number of instructions folded into one chained call.
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 256;

/// Options shared by every job compiled with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineOptions {
    pub compatibility: CompatibilityMode,
    pub mode: TemplateCompilationMode,
    /// Use external message ids (`i18n_<hash>`) instead of file-based names for i18n constants.
    pub i18n_use_external_ids: bool,
    pub enable_chaining: bool,
    pub max_chain_length: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            compatibility: CompatibilityMode::Normal,
            mode: TemplateCompilationMode::Full,
            i18n_use_external_ids: true,
            enable_chaining: true,
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
        }
    }
}

impl PipelineOptions {
    pub fn from_json(source: &str) -> Result<Self> {
        let options: PipelineOptions = serde_json::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chain_length == 0 {
            return Err(PipelineError::InvalidOptions(
                "maxChainLength must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
