//! Ports for external collaborators
//!
//! The audit engine talks to two systems it does not own: the context
//! retriever (vector search over claim documents) and the language model.
//! Both are modelled as port traits in `audit_engine`; this module holds the
//! error type every adapter must report through and the marker trait the
//! ports extend.
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait LanguageModel: DomainPort {
//!     async fn invoke(&self, prompt: &str, sampling: &SamplingParams) -> Result<String, PortError>;
//! }
//! ```

use thiserror::Error;

/// Error type for port operations
///
/// Adapters translate their transport failures into these variants so the
/// engine can decide how to degrade without knowing the concrete backend.
#[derive(Debug, Error)]
pub enum PortError {
    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },
}

impl PortError {
    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        PortError::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }
}

/// Marker trait for all ports
///
/// Ports are shared across concurrently running audit stages, so every
/// implementation must be thread-safe.
pub trait DomainPort: Send + Sync + 'static {}
