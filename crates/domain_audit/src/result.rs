//! Result of one audit stage

use serde::{Deserialize, Serialize};

use crate::deduction::DeductionRecord;
use crate::finding::SpecialFindingResult;
use crate::kind::AuditKind;
use crate::verdict::ComplianceVerdict;

/// Verdict of one audit kind, with its supporting deductions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualAuditResult {
    #[serde(rename = "audit_type")]
    pub kind: AuditKind,
    #[serde(rename = "response")]
    pub verdict: ComplianceVerdict,
    pub justification: String,
    #[serde(rename = "glosas_detectadas", default)]
    pub deductions: Vec<DeductionRecord>,
    #[serde(rename = "special_result", default)]
    pub special_finding: Option<SpecialFindingResult>,
}

impl IndividualAuditResult {
    pub fn new(kind: AuditKind, verdict: ComplianceVerdict, justification: impl Into<String>) -> Self {
        Self {
            kind,
            verdict,
            justification: justification.into(),
            deductions: Vec::new(),
            special_finding: None,
        }
    }

    /// Attaches catalog deductions; ignored for special kinds
    pub fn with_deductions(mut self, deductions: Vec<DeductionRecord>) -> Self {
        if self.kind.is_standard() {
            self.deductions = deductions;
        }
        self
    }

    /// Attaches a special finding; ignored for standard kinds
    pub fn with_special_finding(mut self, finding: Option<SpecialFindingResult>) -> Self {
        if self.kind.is_special() {
            self.special_finding = finding;
        }
        self
    }

    /// Tier-3 result for a stage that could not complete
    pub fn synthesized_failure(kind: AuditKind, cause: &str) -> Self {
        let result = Self::new(
            kind,
            ComplianceVerdict::NoCumple,
            format!("Error en auditoría de {}: {}", kind.label(), cause),
        );
        if kind.is_special() {
            result.with_special_finding(Some(SpecialFindingResult::synthesized_failure(cause)))
        } else {
            result
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.verdict.is_compliant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduction::DeductionLevel;

    fn deduction() -> DeductionRecord {
        DeductionRecord {
            code: "223".to_string(),
            kind: "Factura".to_string(),
            segment: String::new(),
            detail: "Detalle".to_string(),
            scope: String::new(),
            level: DeductionLevel::Claim,
            context: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_special_kinds_never_carry_deductions() {
        let result = IndividualAuditResult::new(AuditKind::RutValidacion, ComplianceVerdict::Cumple, "ok")
            .with_deductions(vec![deduction()]);
        assert!(result.deductions.is_empty());
    }

    #[test]
    fn test_standard_kinds_never_carry_findings() {
        let result = IndividualAuditResult::new(AuditKind::Factura, ComplianceVerdict::Cumple, "ok")
            .with_special_finding(Some(SpecialFindingResult::unreadable_reply()));
        assert!(result.special_finding.is_none());
    }

    #[test]
    fn test_synthesized_failure() {
        let standard = IndividualAuditResult::synthesized_failure(AuditKind::Examenes, "timeout");
        assert_eq!(standard.verdict, ComplianceVerdict::NoCumple);
        assert_eq!(standard.justification, "Error en auditoría de Exámenes: timeout");
        assert!(standard.special_finding.is_none());

        let special = IndividualAuditResult::synthesized_failure(AuditKind::PagadorAdres, "timeout");
        let finding = special.special_finding.unwrap();
        assert!(finding.has_deduction);
        assert_eq!(finding.classification_code.as_deref(), Some("999"));
    }

    #[test]
    fn test_wire_keys() {
        let result = IndividualAuditResult::new(AuditKind::Maos, ComplianceVerdict::NoCumple, "sin soporte");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["audit_type"], "maos");
        assert_eq!(value["response"], "No cumple");
        assert!(value["glosas_detectadas"].as_array().unwrap().is_empty());
        assert!(value["special_result"].is_null());
    }
}
