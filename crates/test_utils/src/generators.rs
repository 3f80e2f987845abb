//! Property-Based Test Generators
//!
//! Proptest strategies producing audit data that respects the engine's
//! invariants: one result per kind, deductions only on standard kinds.

use proptest::prelude::*;

use domain_audit::{AuditKind, ComplianceVerdict, IndividualAuditResult};

use crate::builders::deduction_record;

pub fn audit_kind_strategy() -> impl Strategy<Value = AuditKind> {
    prop::sample::select(AuditKind::ALL.to_vec())
}

pub fn verdict_strategy() -> impl Strategy<Value = ComplianceVerdict> {
    prop_oneof![Just(ComplianceVerdict::Cumple), Just(ComplianceVerdict::NoCumple)]
}

/// Twelve results in enumeration order with random verdicts and up to three
/// deductions per standard kind
pub fn result_set_strategy() -> impl Strategy<Value = Vec<IndividualAuditResult>> {
    (
        prop::collection::vec(verdict_strategy(), 12),
        prop::collection::vec(0usize..=3, 12),
    )
        .prop_map(|(verdicts, deduction_counts)| {
            AuditKind::ALL
                .iter()
                .zip(verdicts)
                .zip(deduction_counts)
                .map(|((kind, verdict), count)| {
                    let count = if kind.is_standard() { count } else { 0 };
                    let deductions = (0..count)
                        .map(|n| deduction_record(&format!("{}", 200 + n), *kind))
                        .collect();
                    IndividualAuditResult::new(*kind, verdict, format!("Resultado de {}", kind.label()))
                        .with_deductions(deductions)
                })
                .collect()
        })
}
