//! Engine configuration

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use core_kernel::{CoreError, FileId};
use domain_audit::request::{DEFAULT_K, DEFAULT_MAX_CONTEXT_CHARS};

/// Environment variable prefix (`AUDIT_CATALOG_FILE_ID`, `AUDIT_MODEL_ID`, ...)
pub const ENV_PREFIX: &str = "AUDIT";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Document holding the deduction catalog
    pub catalog_file_id: FileId,
    /// Retrieval depth used by requests built with [`crate::Orchestrator::new_request`]
    pub default_k: usize,
    /// Context budget used by requests built with [`crate::Orchestrator::new_request`]
    pub default_max_context_chars: usize,
    /// Retrieval depth of catalog lookups
    pub catalog_k: usize,
    /// Overrides the model's own identifier in reports
    pub model_id: Option<String>,
    /// Upper bound for one audit stage
    pub stage_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_file_id: FileId::new(210),
            default_k: DEFAULT_K,
            default_max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            catalog_k: 50,
            model_id: None,
            stage_timeout_secs: 120,
        }
    }
}

impl EngineConfig {
    /// Loads `.env` if present, then reads the environment
    pub fn load() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_env_with(None)
    }

    /// Loads configuration from `source` instead of the process environment
    /// when given; keys use the same `AUDIT_` names
    pub fn from_env_with(source: Option<HashMap<String, String>>) -> Result<Self, CoreError> {
        let config: Self = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(source),
            )
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| CoreError::configuration(e.to_string()))?;

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.default_k == 0 || self.catalog_k == 0 {
            return Err(CoreError::configuration("retrieval depth must be positive"));
        }
        if self.default_max_context_chars == 0 {
            return Err(CoreError::configuration("context budget must be positive"));
        }
        if self.stage_timeout_secs == 0 {
            return Err(CoreError::configuration("stage timeout must be positive"));
        }
        Ok(())
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}
