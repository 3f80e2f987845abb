//! Claim Audit Engine
//!
//! Async half of the claim audit. Runs the twelve audit stages against a
//! context retriever and a language model, consolidates them and renders the
//! v1 or v2 report.
//!
//! # Components
//!
//! - [`Orchestrator`]: fan-out/fan-in over the stages, report envelopes
//! - [`AuditRunner`]: one stage with timeout, panic containment and tiered parsing
//! - [`GlosaExtractor`]: catalog deductions per audit kind
//! - [`ResponseFormatter`]: v1 pass-through, derived or direct v2
//!
//! Collaborators are injected through the [`ports`] traits.

pub mod config;
pub mod context;
pub mod formatter;
pub mod glosa;
pub mod orchestrator;
pub mod ports;
pub mod runner;

pub use config::EngineConfig;
pub use context::{AssembledContext, NO_CONTEXT_PLACEHOLDER, TRUNCATION_MARKER};
pub use formatter::ResponseFormatter;
pub use glosa::GlosaExtractor;
pub use orchestrator::Orchestrator;
pub use ports::{ContextRetriever, LanguageModel, RetrievedDocument, SearchResult};
pub use runner::{AuditRunner, StageOutcome, StageRequest};
