//! Claim audit orchestration
//!
//! One [`Orchestrator::run_full_audit`] call fans out the twelve audit
//! stages concurrently, joins them in enumeration order, optionally
//! consolidates them into a master decision and renders the requested
//! report version. The call never fails: invalid requests and unexpected
//! faults come back as a `success=false` envelope.
//!
//! ```rust,ignore
//! let orchestrator = Orchestrator::new(retriever, model, EngineConfig::load()?);
//! let mut request = orchestrator.new_request([FileId::new(12)]);
//! request.response_format = ResponseFormat::V1;
//! let report = orchestrator.run_full_audit(request).await;
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{error, info, info_span, warn, Instrument};

use core_kernel::{AuditRunId, FileId};
use domain_audit::parsing::parse_verdict_reply;
use domain_audit::prompts::{self, QUESTION_FREE_TEXT, QUESTION_STRUCTURED};
use domain_audit::{
    AuditError, AuditKind, AuditReport, AuditRequest, ComplianceVerdict, QuestionAnswer,
    QuestionAuditReport, QuestionRequest, ReportPayload, ResponseFormat, ResultConsolidator, V2Generation,
};

use crate::config::EngineConfig;
use crate::context::{self, AssembledContext};
use crate::formatter::ResponseFormatter;
use crate::glosa::GlosaExtractor;
use crate::ports::{ContextRetriever, LanguageModel};
use crate::runner::{panic_message, AuditRunner, StageRequest};

const NO_INFORMATION_ANSWER: &str =
    "No se encontró información relevante en los documentos para responder la consulta.";

/// Entry point of the audit engine
#[derive(Clone)]
pub struct Orchestrator {
    retriever: Arc<dyn ContextRetriever>,
    model: Arc<dyn LanguageModel>,
    config: EngineConfig,
    runner: AuditRunner,
    formatter: ResponseFormatter,
    consolidator: ResultConsolidator,
}

impl Orchestrator {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        model: Arc<dyn LanguageModel>,
        config: EngineConfig,
    ) -> Self {
        let glosas = GlosaExtractor::new(retriever.clone(), config.catalog_file_id, config.catalog_k);
        let runner = AuditRunner::new(retriever.clone(), model.clone(), glosas, config.stage_timeout());
        let formatter = ResponseFormatter::new(retriever.clone(), model.clone(), config.stage_timeout());

        Self {
            retriever,
            model,
            config,
            runner,
            formatter,
            consolidator: ResultConsolidator::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runner(&self) -> &AuditRunner {
        &self.runner
    }

    /// Model identifier reported in envelopes
    pub fn model_used(&self) -> &str {
        self.config
            .model_id
            .as_deref()
            .unwrap_or_else(|| self.model.model_id())
    }

    /// Request over `file_ids` with the configured retrieval defaults
    pub fn new_request(&self, file_ids: impl IntoIterator<Item = FileId>) -> AuditRequest {
        AuditRequest {
            k: self.config.default_k,
            max_context_chars: self.config.default_max_context_chars,
            ..AuditRequest::for_files(file_ids)
        }
    }

    /// Runs the full battery of audits and renders the report
    pub async fn run_full_audit(&self, request: AuditRequest) -> AuditReport {
        let run_id = AuditRunId::new_v7();
        let span = info_span!(
            "claim_audit",
            run_id = %run_id,
            files = request.file_ids.len(),
            format = ?request.response_format
        );

        async move {
            let started = Instant::now();
            let format = request.response_format;
            info!("Claim audit started");

            let outcome = AssertUnwindSafe(self.execute(&request)).catch_unwind().await;
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(Ok((payload, documents))) => {
                    info!(documents, elapsed_secs = elapsed, "Claim audit finished");
                    AuditReport::succeeded(payload, documents, self.model_used(), elapsed)
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "Claim audit rejected");
                    AuditReport::failed(format, self.model_used(), elapsed, err.to_string())
                }
                Err(panic) => {
                    let err = AuditError::pipeline(panic_message(panic.as_ref()));
                    error!(error = %err, "Claim audit aborted");
                    AuditReport::failed(format, self.model_used(), elapsed, err.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, request: &AuditRequest) -> Result<(ReportPayload, usize), AuditError> {
        request.check()?;

        let stages: Vec<_> = AuditKind::ALL
            .iter()
            .map(|kind| StageRequest::for_kind(*kind, request))
            .collect();
        let outcomes = join_all(stages.iter().map(|stage| self.runner.run_stage(stage))).await;

        let mut documents: usize = outcomes.iter().map(|o| o.documents_retrieved).sum();
        let results: Vec<_> = outcomes.into_iter().map(|o| o.result).collect();

        let master = request.run_master_audit.then(|| {
            let decision = self.consolidator.consolidate(&results);
            info!(decision = %decision.decision, "Master audit consolidated");
            decision
        });

        let payload = match (request.response_format, request.v2_generation) {
            (ResponseFormat::V1, _) => ResponseFormatter::v1(results, master),
            (ResponseFormat::V2, V2Generation::Derived) => {
                ResponseFormatter::v2_derived(&results, request.claim_id_override())
            }
            (ResponseFormat::V2, V2Generation::Direct) => {
                let (payload, comprehensive) = self.formatter.v2_direct(request).await;
                documents += comprehensive;
                payload
            }
        };

        Ok((payload, documents))
    }

    /// Answers one free-form audit question over the claim documents
    pub async fn answer_question(&self, request: QuestionRequest) -> QuestionAuditReport {
        let run_id = AuditRunId::new_v7();
        let span = info_span!("audit_question", run_id = %run_id, files = request.file_ids.len());

        async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(self.ask(&request)).catch_unwind().await;
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(Ok((answer, context))) => {
                    info!(documents = context.documents_retrieved, elapsed_secs = elapsed, "Question answered");
                    QuestionAuditReport::answered(
                        request.query.clone(),
                        answer,
                        context.text,
                        context.documents_retrieved,
                        self.model_used(),
                        elapsed,
                    )
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "Question audit failed");
                    QuestionAuditReport::failed(request.query.clone(), self.model_used(), elapsed, err.to_string())
                }
                Err(panic) => {
                    let err = AuditError::pipeline(panic_message(panic.as_ref()));
                    error!(error = %err, "Question audit aborted");
                    QuestionAuditReport::failed(request.query.clone(), self.model_used(), elapsed, err.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn ask(&self, request: &QuestionRequest) -> Result<(QuestionAnswer, AssembledContext), AuditError> {
        request.check()?;

        let context = context::gather(
            self.retriever.as_ref(),
            &request.query,
            &request.file_ids,
            request.k,
            request.max_context_chars,
        )
        .await;

        if context.is_placeholder() {
            let answer = if request.use_structured_output {
                QuestionAnswer::Structured {
                    response: ComplianceVerdict::NoCumple,
                    justification: NO_INFORMATION_ANSWER.to_string(),
                }
            } else {
                QuestionAnswer::Text(NO_INFORMATION_ANSWER.to_string())
            };
            return Ok((answer, context));
        }

        let template = if request.use_structured_output {
            QUESTION_STRUCTURED
        } else {
            QUESTION_FREE_TEXT
        };
        let prompt = prompts::render_question(template, &request.query, &context.text);

        let raw = tokio::time::timeout(self.config.stage_timeout(), self.model.invoke(&prompt, &request.sampling))
            .await
            .map_err(|_| AuditError::pipeline("tiempo de espera agotado consultando el modelo"))?
            .map_err(|e| AuditError::pipeline(format!("error del modelo: {e}")))?;

        let answer = if request.use_structured_output {
            let reply = parse_verdict_reply(&raw);
            QuestionAnswer::Structured {
                response: reply.verdict,
                justification: reply.justification,
            }
        } else {
            QuestionAnswer::Text(raw.trim().to_string())
        };

        Ok((answer, context))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("model", &self.model_used())
            .field("config", &self.config)
            .finish()
    }
}
