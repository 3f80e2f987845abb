//! Claim Audit Domain
//!
//! This crate holds the pure part of the claim audit: the battery of audit
//! kinds, the deduction catalog grammar, tolerant reading of model replies,
//! the master consolidation rule, and both report contracts.
//!
//! # Audit flow
//!
//! ```text
//! 12 audits (7 standard + 5 special) -> consolidation -> v1 | v2 report
//! ```
//!
//! Nothing here performs I/O; the async engine lives in `audit_engine`.

pub mod kind;
pub mod verdict;
pub mod deduction;
pub mod finding;
pub mod result;
pub mod decision;
pub mod consolidation;
pub mod catalog;
pub mod parsing;
pub mod prompts;
pub mod report;
pub mod repair;
pub mod derivation;
pub mod request;
pub mod error;

pub use kind::AuditKind;
pub use verdict::ComplianceVerdict;
pub use deduction::{DeductionLevel, DeductionRecord};
pub use finding::SpecialFindingResult;
pub use result::IndividualAuditResult;
pub use decision::{DecisionKind, MasterDecision};
pub use consolidation::ResultConsolidator;
pub use parsing::{ParseOutcome, ParsedReply};
pub use report::{
    AuditReport, ClaimAuditDocument, ClaimItem, ClaimTotalDeductionClassification,
    ItemDeductionClassification, QuestionAnswer, QuestionAuditReport, ReportPayload,
};
pub use request::{AuditRequest, QuestionRequest, ResponseFormat, SamplingParams, V2Generation};
pub use error::AuditError;
