//! v2 documents derived from individual results
//!
//! Special findings with a deduction become claim-level deductions. Standard
//! audits with catalog deductions become one synthetic item each, carrying
//! one classification per deduction. Billed values are not known here and
//! are reported as zero.

use core_kernel::WholeAmount;

use crate::finding::SENTINEL_CLASSIFICATION;
use crate::parsing::truncate_with_ellipsis;
use crate::report::{ClaimAuditDocument, ClaimItem, ClaimTotalDeductionClassification, ItemDeductionClassification};
use crate::result::IndividualAuditResult;

const DEFAULT_CLAIM_ID: &str = "reclamacion_auditoria_medica";
const ITEM_JUSTIFICATION_CHARS: usize = 200;
const NOT_APPLICABLE: &str = "No aplica";

/// Builds a v2 document from the twelve individual results
pub fn derive_document(results: &[IndividualAuditResult], claim_id: Option<&str>) -> ClaimAuditDocument {
    let total_deductions: Vec<_> = results
        .iter()
        .filter_map(|result| result.special_finding.as_ref())
        .filter(|finding| finding.has_deduction)
        .map(|finding| ClaimTotalDeductionClassification {
            code: finding
                .classification_code
                .clone()
                .unwrap_or_else(|| SENTINEL_CLASSIFICATION.to_string()),
            description: finding.description.clone(),
            justification: finding.justification.clone(),
            references: split_references(&finding.referenced_documents),
        })
        .collect();

    let mut items: Vec<_> = results
        .iter()
        .filter(|result| result.kind.is_standard() && !result.deductions.is_empty())
        .map(|result| {
            let justification = truncate_with_ellipsis(&result.justification, ITEM_JUSTIFICATION_CHARS);
            let classifications = result
                .deductions
                .iter()
                .map(|record| ItemDeductionClassification {
                    code: record.numeric_code().unwrap_or(999),
                    description: record.detail.clone(),
                    justification: justification.clone(),
                    references: Vec::new(),
                })
                .collect();

            ClaimItem::new(
                format!("{}_001", result.kind.key().to_uppercase()),
                format!("Servicio de {}", result.kind.label()),
                true,
                WholeAmount::zero(),
                classifications,
            )
        })
        .collect();

    if items.is_empty() {
        items.push(ClaimItem::clean("SERVICIO_001", "Servicios médicos generales", WholeAmount::zero()));
    }

    let has_total_deduction = !total_deductions.is_empty();
    let justification = if has_total_deduction {
        "La reclamación presenta glosas totales que impiden su aprobación."
    } else {
        "La reclamación ha sido procesada sin glosas totales."
    };

    ClaimAuditDocument {
        claim_id: claim_id.unwrap_or(DEFAULT_CLAIM_ID).to_string(),
        has_total_deduction,
        justification: justification.to_string(),
        total_deductions,
        items,
    }
}

fn split_references(documents: &str) -> Vec<String> {
    if documents.trim() == NOT_APPLICABLE {
        return Vec::new();
    }
    documents.split(", ").map(str::to_string).collect()
}
