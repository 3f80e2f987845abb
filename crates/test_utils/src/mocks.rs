//! In-Memory Collaborators
//!
//! Scripted implementations of the engine ports. Both record what they were
//! asked so tests can assert on prompts and queries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use audit_engine::ports::{ContextRetriever, LanguageModel, RetrievedDocument, SearchResult};
use core_kernel::{DomainPort, FileId, PortError};
use domain_audit::SamplingParams;

/// What a [`ScriptedModel`] does for a matching prompt
#[derive(Debug, Clone)]
pub enum ModelBehavior {
    Reply(String),
    Fail(String),
    Panic(String),
    /// Sleeps this long, then replies
    Delay(Duration, String),
    /// Never answers in any reasonable time
    Hang,
}

/// Language model answering by prompt substring
///
/// Rules are checked in insertion order; the first whose needle occurs in
/// the prompt decides. Prompts matching no rule get the fallback.
#[derive(Debug)]
pub struct ScriptedModel {
    id: String,
    rules: Vec<(String, ModelBehavior)>,
    fallback: ModelBehavior,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(fallback: ModelBehavior) -> Self {
        Self {
            id: "scripted-model".to_string(),
            rules: Vec::new(),
            fallback,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Model answering every prompt with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new(ModelBehavior::Reply(reply.into()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn on(mut self, needle: impl Into<String>, behavior: ModelBehavior) -> Self {
        self.rules.push((needle.into(), behavior));
        self
    }

    pub fn on_reply(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.on(needle, ModelBehavior::Reply(reply.into()))
    }

    /// Number of invocations so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in arrival order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn behavior_for(&self, prompt: &str) -> ModelBehavior {
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, behavior)| behavior.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl DomainPort for ScriptedModel {}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, prompt: &str, _sampling: &SamplingParams) -> Result<String, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.behavior_for(prompt) {
            ModelBehavior::Reply(reply) => Ok(reply),
            ModelBehavior::Fail(message) => Err(PortError::connection(message)),
            ModelBehavior::Panic(message) => panic!("{message}"),
            ModelBehavior::Delay(delay, reply) => {
                tokio::time::sleep(delay).await;
                Ok(reply)
            }
            ModelBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(PortError::timeout("invoke", 24 * 60 * 60 * 1000))
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

/// Retriever serving fixed chunks by query substring
///
/// `k` caps the number of chunks returned; `total_documents` reports the
/// capped count.
#[derive(Debug, Default)]
pub struct InMemoryRetriever {
    rules: Vec<(String, Vec<RetrievedDocument>)>,
    documents: Vec<RetrievedDocument>,
    queries: Mutex<Vec<String>>,
}

impl InMemoryRetriever {
    /// Retriever returning `documents` for every query
    pub fn with_documents(documents: Vec<RetrievedDocument>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Retriever with no documents at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serves `documents` for queries containing `needle`
    pub fn on_query(mut self, needle: impl Into<String>, documents: Vec<RetrievedDocument>) -> Self {
        self.rules.push((needle.into(), documents));
        self
    }

    /// Every query received, in arrival order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl DomainPort for InMemoryRetriever {}

#[async_trait]
impl ContextRetriever for InMemoryRetriever {
    async fn search(&self, query: &str, _file_ids: &[FileId], k: usize) -> Result<SearchResult, PortError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        let documents = self
            .rules
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, documents)| documents)
            .unwrap_or(&self.documents);

        Ok(SearchResult::new(documents.iter().take(k).cloned().collect()))
    }
}

/// Retriever whose every search fails
#[derive(Debug, Default)]
pub struct FailingRetriever;

impl DomainPort for FailingRetriever {}

#[async_trait]
impl ContextRetriever for FailingRetriever {
    async fn search(&self, _query: &str, _file_ids: &[FileId], _k: usize) -> Result<SearchResult, PortError> {
        Err(PortError::connection("vector store unreachable"))
    }
}
