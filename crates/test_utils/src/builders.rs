//! Test Data Builders
//!
//! Builders for the twelve-result sets fed to consolidation and v2
//! derivation. Unspecified kinds comply without deductions.

use domain_audit::{
    AuditKind, ComplianceVerdict, DeductionLevel, DeductionRecord, IndividualAuditResult, SpecialFindingResult,
};

/// Builder for a complete set of individual results
#[derive(Debug, Clone)]
pub struct ResultSetBuilder {
    results: Vec<IndividualAuditResult>,
}

impl Default for ResultSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSetBuilder {
    /// Twelve compliant results in enumeration order
    pub fn new() -> Self {
        Self {
            results: AuditKind::ALL
                .iter()
                .map(|kind| {
                    IndividualAuditResult::new(*kind, ComplianceVerdict::Cumple, format!("{} conforme", kind.label()))
                })
                .collect(),
        }
    }

    /// Marks the first `count` kinds, in enumeration order, as non-compliant
    pub fn with_non_compliant(mut self, count: usize) -> Self {
        for result in self.results.iter_mut().take(count) {
            result.verdict = ComplianceVerdict::NoCumple;
        }
        self
    }

    pub fn with_verdict(mut self, kind: AuditKind, verdict: ComplianceVerdict) -> Self {
        if let Some(result) = self.result_mut(kind) {
            result.verdict = verdict;
        }
        self
    }

    /// Spreads `count` deductions round-robin over the standard kinds
    pub fn with_deductions(mut self, count: usize) -> Self {
        for n in 0..count {
            let kind = AuditKind::STANDARD[n % AuditKind::STANDARD.len()];
            let record = deduction_record(&format!("{}", 100 + n), kind);
            if let Some(result) = self.result_mut(kind) {
                result.deductions.push(record);
            }
        }
        self
    }

    pub fn with_special_finding(mut self, kind: AuditKind, finding: SpecialFindingResult) -> Self {
        if let Some(result) = self.result_mut(kind) {
            *result = result.clone().with_special_finding(Some(finding));
        }
        self
    }

    pub fn build(self) -> Vec<IndividualAuditResult> {
        self.results
    }

    fn result_mut(&mut self, kind: AuditKind) -> Option<&mut IndividualAuditResult> {
        self.results.iter_mut().find(|result| result.kind == kind)
    }
}

/// Item-level catalog deduction for `kind`
pub fn deduction_record(code: &str, kind: AuditKind) -> DeductionRecord {
    DeductionRecord {
        code: code.to_string(),
        kind: kind.label().to_string(),
        segment: "Soportes".to_string(),
        detail: format!("Detalle de la glosa {code}"),
        scope: "Parcial".to_string(),
        level: DeductionLevel::Item,
        context: String::new(),
        notes: String::new(),
    }
}

/// Special finding carrying a deduction
pub fn deduction_finding(code: Option<&str>, documents: &str) -> SpecialFindingResult {
    SpecialFindingResult {
        claim_id: "REC-77.pdf".to_string(),
        has_deduction: true,
        justification: "Soporte ausente".to_string(),
        referenced_documents: documents.to_string(),
        classification_code: code.map(str::to_string),
        description: "Falta de soporte".to_string(),
    }
}
