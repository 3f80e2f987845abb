//! Master audit: merging twelve verdicts into one decision
//!
//! The rule is evaluated top to bottom, first match wins:
//!
//! ```text
//! non-compliant == 0           -> Aprobada total
//! non-compliant >= 5           -> Devuelta
//! merged deductions > 10       -> Devuelta
//! otherwise                    -> Aprobada parcial
//! ```

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{info, warn};

use crate::deduction::DeductionRecord;
use crate::decision::{DecisionKind, MasterDecision};
use crate::error::AuditError;
use crate::kind::AuditKind;
use crate::result::IndividualAuditResult;
use crate::verdict::ComplianceVerdict;

/// Non-compliant audits at which the claim is returned outright
pub const RETURN_NON_COMPLIANT_THRESHOLD: usize = 5;
/// Merged deductions above which the claim is returned
pub const RETURN_DEDUCTION_THRESHOLD: usize = 10;
/// Deductions rendered in the consolidated text
pub const MAX_RENDERED_DEDUCTIONS: usize = 20;

const DETAIL_PREVIEW_CHARS: usize = 100;

/// A catalog deduction tagged with the audit that attached it
#[derive(Debug, Clone, Copy)]
pub struct SourcedDeduction<'a> {
    pub source: AuditKind,
    pub record: &'a DeductionRecord,
}

/// Consolidates individual audit results into a [`MasterDecision`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultConsolidator;

impl ResultConsolidator {
    pub fn new() -> Self {
        Self
    }

    /// Consolidates, degrading any failure to a `Devuelta` decision
    pub fn consolidate(&self, results: &[IndividualAuditResult]) -> MasterDecision {
        match catch_unwind(AssertUnwindSafe(|| self.try_consolidate(results))) {
            Ok(Ok(decision)) => decision,
            Ok(Err(error)) => {
                warn!(error = %error, "Master audit failed, returning claim");
                MasterDecision::consolidation_failure(&error.to_string())
            }
            Err(_) => {
                warn!("Master audit panicked, returning claim");
                MasterDecision::consolidation_failure("fallo interno durante la consolidación")
            }
        }
    }

    /// Consolidates a complete result set
    ///
    /// Requires exactly one result per audit kind.
    pub fn try_consolidate(&self, results: &[IndividualAuditResult]) -> Result<MasterDecision, AuditError> {
        let ordered = Self::order_by_kind(results)?;

        let non_compliant = ordered
            .iter()
            .filter(|r| r.verdict == ComplianceVerdict::NoCumple)
            .count();
        let merged = Self::merge_deductions(&ordered);
        let decision = Self::decide(non_compliant, merged.len());

        info!(
            decision = %decision,
            non_compliant,
            deductions = merged.len(),
            "Master audit consolidated"
        );

        Ok(MasterDecision {
            decision,
            glosas: Self::render_deductions(&merged),
            justification: Self::render_justification(decision, &ordered, &merged),
        })
    }

    /// The decision rule alone
    pub fn decide(non_compliant: usize, merged_deductions: usize) -> DecisionKind {
        if non_compliant == 0 {
            DecisionKind::Approved
        } else if non_compliant >= RETURN_NON_COMPLIANT_THRESHOLD {
            DecisionKind::Returned
        } else if merged_deductions > RETURN_DEDUCTION_THRESHOLD {
            DecisionKind::Returned
        } else {
            DecisionKind::PartiallyApproved
        }
    }

    /// Flattens the deductions of every standard audit, tagged by source
    pub fn merge_deductions<'a>(results: &[&'a IndividualAuditResult]) -> Vec<SourcedDeduction<'a>> {
        results
            .iter()
            .filter(|r| r.kind.is_standard())
            .flat_map(|r| {
                r.deductions.iter().map(move |record| SourcedDeduction {
                    source: r.kind,
                    record,
                })
            })
            .collect()
    }

    fn order_by_kind(results: &[IndividualAuditResult]) -> Result<Vec<&IndividualAuditResult>, AuditError> {
        if results.len() != AuditKind::ALL.len() {
            return Err(AuditError::consolidation(format!(
                "se esperaban {} resultados, se recibieron {}",
                AuditKind::ALL.len(),
                results.len()
            )));
        }

        let mut seen = HashSet::new();
        for result in results {
            if !seen.insert(result.kind) {
                return Err(AuditError::consolidation(format!(
                    "resultado duplicado para {}",
                    result.kind.label()
                )));
            }
        }

        AuditKind::ALL
            .iter()
            .map(|kind| {
                results
                    .iter()
                    .find(|r| r.kind == *kind)
                    .ok_or_else(|| AuditError::consolidation(format!("falta el resultado de {}", kind.label())))
            })
            .collect()
    }

    fn render_deductions(merged: &[SourcedDeduction<'_>]) -> String {
        if merged.is_empty() {
            return "No se detectaron glosas específicas".to_string();
        }

        merged
            .iter()
            .take(MAX_RENDERED_DEDUCTIONS)
            .map(|sourced| {
                let record = sourced.record;
                let kind = if record.kind.trim().is_empty() {
                    sourced.source.label()
                } else {
                    record.kind.as_str()
                };
                let detail: String = record.detail.chars().take(DETAIL_PREVIEW_CHARS).collect();
                format!(
                    "Código: {} | Tipo: {} | Segmento: {} | Detalle: {}...",
                    record.code,
                    kind,
                    record.segment_or_general(),
                    detail
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_justification(
        decision: DecisionKind,
        ordered: &[&IndividualAuditResult],
        merged: &[SourcedDeduction<'_>],
    ) -> String {
        let mut lines = vec![
            format!("La cuenta médica fue clasificada como {decision} basándose en los siguientes hallazgos:"),
            String::new(),
            "Resumen de auditorías:".to_string(),
        ];
        lines.extend(ordered.iter().map(|r| format!("{}: {}", r.kind.label(), r.verdict)));

        if !merged.is_empty() {
            lines.push(String::new());
            lines.push(format!("Se detectaron {} glosas oficiales del catálogo:", merged.len()));
            for kind in AuditKind::STANDARD {
                let count = merged.iter().filter(|d| d.source == kind).count();
                lines.push(format!("- Glosas de {}: {}", kind.label(), count));
            }
        }

        lines.join("\n")
    }
}
