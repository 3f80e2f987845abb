//! Report payload rendering
//!
//! v1 passes the individual results through. v2 is either derived from them
//! or generated by one comprehensive model call and repaired; a failed call
//! or an unrepairable reply yields the conservative record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use domain_audit::derivation::derive_document;
use domain_audit::prompts::{self, COMPREHENSIVE_QUERY, COMPREHENSIVE_V2};
use domain_audit::repair::repair_or_fallback;
use domain_audit::{AuditRequest, ClaimAuditDocument, IndividualAuditResult, MasterDecision, ReportPayload};

use crate::context;
use crate::ports::{ContextRetriever, LanguageModel};

/// Renders report payloads
#[derive(Clone)]
pub struct ResponseFormatter {
    retriever: Arc<dyn ContextRetriever>,
    model: Arc<dyn LanguageModel>,
    call_timeout: Duration,
}

impl ResponseFormatter {
    pub fn new(retriever: Arc<dyn ContextRetriever>, model: Arc<dyn LanguageModel>, call_timeout: Duration) -> Self {
        Self {
            retriever,
            model,
            call_timeout,
        }
    }

    /// v1 payload: the results and the optional master decision
    pub fn v1(results: Vec<IndividualAuditResult>, master: Option<MasterDecision>) -> ReportPayload {
        ReportPayload::V1 {
            individual_audits: results,
            master_audit: master,
        }
    }

    /// v2 payload derived from the individual results
    pub fn v2_derived(results: &[IndividualAuditResult], claim_id: Option<&str>) -> ReportPayload {
        ReportPayload::V2 {
            audit_result: Some(derive_document(results, claim_id)),
        }
    }

    /// v2 payload generated directly by the model, with the number of
    /// documents the comprehensive retrieval returned
    pub async fn v2_direct(&self, request: &AuditRequest) -> (ReportPayload, usize) {
        let claim_id = request.claim_id_override();
        let context = context::gather(
            self.retriever.as_ref(),
            COMPREHENSIVE_QUERY,
            &request.file_ids,
            request.k,
            request.max_context_chars,
        )
        .await;

        let prompt = prompts::render(COMPREHENSIVE_V2, &context.text);
        let document = match tokio::time::timeout(self.call_timeout, self.model.invoke(&prompt, &request.sampling)).await {
            Ok(Ok(raw)) => repair_or_fallback(&raw, claim_id),
            Ok(Err(error)) => {
                warn!(error = %error, "Direct v2 generation failed, using conservative record");
                ClaimAuditDocument::conservative_fallback(claim_id, &error.to_string())
            }
            Err(_) => {
                warn!(timeout_ms = self.call_timeout.as_millis() as u64, "Direct v2 generation timed out");
                ClaimAuditDocument::conservative_fallback(claim_id, "tiempo de espera agotado")
            }
        };

        info!(
            documents = context.documents_retrieved,
            items = document.items.len(),
            total_deduction = document.has_total_deduction,
            "Direct v2 document generated"
        );

        (
            ReportPayload::V2 {
                audit_result: Some(document),
            },
            context.documents_retrieved,
        )
    }
}

impl std::fmt::Debug for ResponseFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFormatter")
            .field("model", &self.model.model_id())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
