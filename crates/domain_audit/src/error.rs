//! Audit domain errors

use core_kernel::{AmountError, PortError};
use thiserror::Error;

/// Errors that can occur while auditing a claim
///
/// Most of these are contained where they arise: retrieval errors empty the
/// context, parse errors fall back to the text scan, consolidation errors
/// return the claim, repair errors produce the conservative v2 record. Only
/// `InvalidRequest` and `Pipeline` reach the report envelope.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] PortError),

    #[error("Could not parse model reply: {0}")]
    Parse(String),

    #[error("Consolidation failed: {0}")]
    Consolidation(String),

    #[error("Could not repair v2 reply: {0}")]
    FormatRepair(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Audit pipeline failed: {0}")]
    Pipeline(String),
}

impl AuditError {
    pub fn parse(message: impl Into<String>) -> Self {
        AuditError::Parse(message.into())
    }

    pub fn consolidation(message: impl Into<String>) -> Self {
        AuditError::Consolidation(message.into())
    }

    pub fn format_repair(message: impl Into<String>) -> Self {
        AuditError::FormatRepair(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        AuditError::InvalidRequest(message.into())
    }

    pub fn pipeline(message: impl Into<String>) -> Self {
        AuditError::Pipeline(message.into())
    }
}

impl From<AmountError> for AuditError {
    fn from(error: AmountError) -> Self {
        AuditError::FormatRepair(error.to_string())
    }
}

impl From<validator::ValidationErrors> for AuditError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuditError::InvalidRequest(errors.to_string())
    }
}
