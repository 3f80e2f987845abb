//! Single audit stage execution
//!
//! A stage retrieves context, renders the kind's prompt, invokes the model
//! and reads the reply. The catalog lookup for the kind runs alongside the
//! model attempt. Both are bounded by the stage timeout and shielded from
//! panics, so a stage always yields an [`IndividualAuditResult`]:
//!
//! | what happened                         | tier              |
//! |---------------------------------------|-------------------|
//! | reply decoded as JSON                 | `Parsed`          |
//! | reply read by the keyword scan        | `FallbackParsed`  |
//! | model error, timeout or panic         | `Failed`          |

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tracing::{info, warn};

use core_kernel::FileId;
use domain_audit::parsing::parse_audit_reply;
use domain_audit::prompts;
use domain_audit::{AuditKind, AuditRequest, IndividualAuditResult, ParseOutcome, SamplingParams};

use crate::context;
use crate::glosa::GlosaExtractor;
use crate::ports::{ContextRetriever, LanguageModel};

/// Everything one stage needs from the request
#[derive(Debug, Clone)]
pub struct StageRequest<'a> {
    pub kind: AuditKind,
    pub template: &'a str,
    pub context_query: &'a str,
    pub file_ids: &'a [FileId],
    pub k: usize,
    pub max_context_chars: usize,
    pub sampling: SamplingParams,
}

impl<'a> StageRequest<'a> {
    /// Stage for `kind` with the kind's prompt and the request's query override
    pub fn for_kind(kind: AuditKind, request: &'a AuditRequest) -> Self {
        Self {
            kind,
            template: prompts::template_for(kind),
            context_query: request.query_for(kind),
            file_ids: &request.file_ids,
            k: request.k,
            max_context_chars: request.max_context_chars,
            sampling: request.sampling,
        }
    }
}

/// Result of a stage plus its accounting
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub result: IndividualAuditResult,
    pub documents_retrieved: usize,
    pub outcome: ParseOutcome,
}

/// Runs audit stages against the injected collaborators
#[derive(Clone)]
pub struct AuditRunner {
    retriever: Arc<dyn ContextRetriever>,
    model: Arc<dyn LanguageModel>,
    glosas: GlosaExtractor,
    stage_timeout: Duration,
}

impl AuditRunner {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        model: Arc<dyn LanguageModel>,
        glosas: GlosaExtractor,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            model,
            glosas,
            stage_timeout,
        }
    }

    /// Runs one stage and returns its result
    pub async fn run(&self, stage: &StageRequest<'_>) -> IndividualAuditResult {
        self.run_stage(stage).await.result
    }

    /// Runs one stage and returns its result with accounting
    pub async fn run_stage(&self, stage: &StageRequest<'_>) -> StageOutcome {
        let kind = stage.kind;
        let started = Instant::now();
        info!(kind = %kind, "Audit stage started");

        let deadline = started + self.stage_timeout;
        let ((documents_retrieved, reply), deductions) = futures::join!(
            self.attempt(stage, deadline),
            self.contained(deadline, self.glosas.extract_for(kind)),
        );

        let deductions = deductions.unwrap_or_else(|cause| {
            warn!(kind = %kind, cause = %cause, "Catalog lookup aborted, continuing without deductions");
            Vec::new()
        });

        let (result, outcome) = match reply {
            Ok(raw) => {
                let parsed = parse_audit_reply(&raw, kind);
                let result = IndividualAuditResult::new(kind, parsed.verdict, parsed.justification)
                    .with_special_finding(parsed.special_finding);
                (result, parsed.outcome)
            }
            Err(cause) => {
                warn!(kind = %kind, cause = %cause, "Audit stage failed, synthesizing result");
                (IndividualAuditResult::synthesized_failure(kind, &cause), ParseOutcome::Failed)
            }
        };

        let result = result.with_deductions(deductions);

        info!(
            kind = %kind,
            documents = documents_retrieved,
            tier = ?outcome,
            verdict = result.verdict.as_str(),
            deductions = result.deductions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Audit stage finished"
        );

        StageOutcome {
            result,
            documents_retrieved,
            outcome,
        }
    }

    /// Retrieval, rendering and model call; returns the retrieval count with
    /// the model's reply or the cause it never arrived
    ///
    /// The count survives a model call that fails, hangs or panics.
    async fn attempt(&self, stage: &StageRequest<'_>, deadline: Instant) -> (usize, Result<String, String>) {
        let gathered = self
            .contained(
                deadline,
                context::gather(
                    self.retriever.as_ref(),
                    stage.context_query,
                    stage.file_ids,
                    stage.k,
                    stage.max_context_chars,
                ),
            )
            .await;
        let context = match gathered {
            Ok(context) => context,
            Err(cause) => return (0, Err(cause)),
        };

        let prompt = prompts::render(stage.template, &context.text);
        let reply = match self.contained(deadline, self.model.invoke(&prompt, &stage.sampling)).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(error)) => Err(error.to_string()),
            Err(cause) => Err(cause),
        };
        (context.documents_retrieved, reply)
    }

    /// Bounds `future` by the stage deadline and converts a panic into a cause
    async fn contained<T>(&self, deadline: Instant, future: impl Future<Output = T>) -> Result<T, String> {
        match tokio::time::timeout_at(deadline, AssertUnwindSafe(future).catch_unwind()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(panic)) => Err(format!("fallo interno: {}", panic_message(panic.as_ref()))),
            Err(_) => Err(format!(
                "tiempo de espera agotado tras {} ms",
                self.stage_timeout.as_millis()
            )),
        }
    }
}

impl std::fmt::Debug for AuditRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRunner")
            .field("model", &self.model.model_id())
            .field("glosas", &self.glosas)
            .field("stage_timeout", &self.stage_timeout)
            .finish()
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "pánico sin mensaje".to_string()
    }
}
