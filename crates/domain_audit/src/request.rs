//! Audit requests and their validation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::FileId;

use crate::error::AuditError;
use crate::kind::AuditKind;

pub const DEFAULT_K: usize = 10;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 5000;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TOP_P: f64 = 0.75;

/// Report contract requested by the caller; itemized v2 unless v1 is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    V1,
    #[default]
    V2,
}

/// How a v2 document is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum V2Generation {
    /// Built from the twelve individual results
    #[default]
    Derived,
    /// One comprehensive model call emitting the document directly
    Direct,
}

/// Sampling parameters forwarded to the language model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct SamplingParams {
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[validate(range(min = 500, max = 4000))]
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
        }
    }
}

/// A full claim audit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AuditRequest {
    #[serde(rename = "files_ids", default)]
    pub file_ids: Vec<FileId>,
    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_k")]
    pub k: usize,
    #[validate(range(min = 1000, max = 20000))]
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[validate(nested)]
    #[serde(flatten)]
    pub sampling: SamplingParams,
    #[serde(default = "default_true")]
    pub run_master_audit: bool,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default)]
    pub v2_generation: V2Generation,
    /// Retrieval query overrides keyed by audit kind wire key
    #[serde(default)]
    pub custom_queries: Option<HashMap<String, String>>,
    /// Claim identifier override for v2 documents
    #[serde(default, alias = "identificacion_reclamacion")]
    pub claim_id: Option<String>,
}

impl Default for AuditRequest {
    fn default() -> Self {
        Self {
            file_ids: Vec::new(),
            k: DEFAULT_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            sampling: SamplingParams::default(),
            run_master_audit: true,
            response_format: ResponseFormat::default(),
            v2_generation: V2Generation::default(),
            custom_queries: None,
            claim_id: None,
        }
    }
}

impl AuditRequest {
    pub fn for_files(file_ids: impl IntoIterator<Item = FileId>) -> Self {
        Self {
            file_ids: file_ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Validates ranges, mapping failures to [`AuditError::InvalidRequest`]
    pub fn check(&self) -> Result<(), AuditError> {
        self.validate().map_err(AuditError::from)
    }

    /// Caller-supplied query for `kind`, ignoring blank overrides
    pub fn query_override(&self, kind: AuditKind) -> Option<&str> {
        self.custom_queries
            .as_ref()?
            .get(kind.key())
            .map(String::as_str)
            .filter(|query| !query.trim().is_empty())
    }

    /// Query actually used for `kind`
    pub fn query_for(&self, kind: AuditKind) -> &str {
        self.query_override(kind).unwrap_or_else(|| kind.default_query())
    }

    /// Non-blank claim identifier override
    pub fn claim_id_override(&self) -> Option<&str> {
        self.claim_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// A single free-form audit question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1))]
    pub query: String,
    #[serde(rename = "files_ids", default)]
    pub file_ids: Vec<FileId>,
    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_k")]
    pub k: usize,
    #[validate(range(min = 1000, max = 20000))]
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[validate(nested)]
    #[serde(flatten)]
    pub sampling: SamplingParams,
    /// Ask for a JSON verdict rather than free text
    #[serde(default = "default_true")]
    pub use_structured_output: bool,
}

impl QuestionRequest {
    pub fn new(query: impl Into<String>, file_ids: impl IntoIterator<Item = FileId>) -> Self {
        Self {
            query: query.into(),
            file_ids: file_ids.into_iter().collect(),
            k: DEFAULT_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            sampling: SamplingParams::default(),
            use_structured_output: true,
        }
    }

    pub fn check(&self) -> Result<(), AuditError> {
        if self.query.trim().is_empty() {
            return Err(AuditError::invalid_request("query must not be blank"));
        }
        self.validate().map_err(AuditError::from)
    }
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_max_context_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_top_p() -> f64 {
    DEFAULT_TOP_P
}

fn default_true() -> bool {
    true
}
