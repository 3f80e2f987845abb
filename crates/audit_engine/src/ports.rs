//! Audit Engine Ports
//!
//! The engine depends on two collaborators it does not own:
//!
//! - **ContextRetriever**: semantic search over the claim's documents and the
//!   deduction catalog.
//! - **LanguageModel**: completion endpoint that answers the audit prompts.
//!
//! Adapters (HTTP clients, vector stores, mocks) implement these traits and
//! are injected into the [`Orchestrator`](crate::Orchestrator) as
//! `Arc<dyn Trait>`.
//!
//! ```rust,ignore
//! let orchestrator = Orchestrator::new(
//!     Arc::new(VectorStoreRetriever::new(client)),
//!     Arc::new(ChatModel::new(endpoint)),
//!     EngineConfig::load()?,
//! );
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, FileId, PortError};
use domain_audit::SamplingParams;

/// One chunk returned by the retriever
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Position label used in the assembled context
    pub index: usize,
    pub content: String,
    /// Source document; chunks without one are never catalog chunks
    pub file_id: Option<FileId>,
    pub chunk_id: Option<String>,
}

impl RetrievedDocument {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
            file_id: None,
            chunk_id: None,
        }
    }

    pub fn in_file(mut self, file_id: FileId) -> Self {
        self.file_id = Some(file_id);
        self
    }
}

/// Result of a retrieval call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub documents: Vec<RetrievedDocument>,
    pub total_documents: usize,
}

impl SearchResult {
    pub fn new(documents: Vec<RetrievedDocument>) -> Self {
        let total_documents = documents.len();
        Self {
            documents,
            total_documents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Semantic search over claim documents
#[async_trait]
pub trait ContextRetriever: DomainPort {
    /// Returns up to `k` chunks relevant to `query`, restricted to `file_ids`
    /// when the slice is not empty
    async fn search(&self, query: &str, file_ids: &[FileId], k: usize) -> Result<SearchResult, PortError>;
}

/// Completion endpoint answering audit prompts
#[async_trait]
pub trait LanguageModel: DomainPort {
    /// Sends one prompt and returns the raw reply text
    async fn invoke(&self, prompt: &str, sampling: &SamplingParams) -> Result<String, PortError>;

    /// Identifier reported as `model_used`
    fn model_id(&self) -> &str;
}
