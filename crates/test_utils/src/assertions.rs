//! Custom Test Assertions
//!
//! Assertion helpers for audit results and report JSON that give more
//! meaningful failure messages than plain `assert!`.

use serde_json::Value;

use domain_audit::{AuditKind, AuditReport, IndividualAuditResult, ReportPayload};

/// Asserts one result per kind, in enumeration order, with no deductions on
/// special kinds
pub fn assert_complete_result_set(results: &[IndividualAuditResult]) {
    let kinds: Vec<_> = results.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, AuditKind::ALL.to_vec(), "Results are not one per kind in enumeration order");

    for result in results.iter().filter(|r| r.kind.is_special()) {
        assert!(
            result.deductions.is_empty(),
            "Special audit {} carries catalog deductions",
            result.kind
        );
    }
}

/// Asserts that every item of a serialized v2 document omits
/// `clasificacion_glosas` unless it is partial with classifications
pub fn assert_classification_keys_consistent(document: &Value) {
    let items = document
        .get("items_reclamados")
        .and_then(Value::as_array)
        .unwrap_or_else(|| panic!("Document has no items_reclamados array: {document}"));

    for item in items {
        let partial = item.get("glosa_parcial").and_then(Value::as_bool).unwrap_or(false);
        match item.get("clasificacion_glosas") {
            None => {}
            Some(Value::Array(list)) if partial && !list.is_empty() => {}
            Some(other) => panic!("Item {item} carries clasificacion_glosas {other} but partial={partial}"),
        }
    }
}

/// Returns the individual results of a successful v1 report
pub fn expect_v1_results(report: &AuditReport) -> &[IndividualAuditResult] {
    assert!(report.success, "Expected a successful report, got error {:?}", report.error);
    match &report.payload {
        ReportPayload::V1 { individual_audits, .. } => individual_audits,
        ReportPayload::V2 { .. } => panic!("Expected a v1 payload, got v2"),
    }
}

/// Returns the result of `kind` from a successful v1 report
pub fn expect_result(report: &AuditReport, kind: AuditKind) -> &IndividualAuditResult {
    expect_v1_results(report)
        .iter()
        .find(|r| r.kind == kind)
        .unwrap_or_else(|| panic!("No result for {kind}"))
}
