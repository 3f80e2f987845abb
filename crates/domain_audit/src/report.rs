//! Report contracts
//!
//! Two incompatible shapes are served from the same audit run:
//!
//! - **v1**: the twelve individual results plus the optional master decision,
//!   passed through as-is.
//! - **v2**: an itemized claim document ([`ClaimAuditDocument`]).
//!
//! Both share the envelope fields of [`AuditReport`]. Wire names follow the
//! legacy contract and are therefore Spanish.

use serde::{Deserialize, Serialize};

use core_kernel::WholeAmount;

use crate::decision::MasterDecision;
use crate::request::ResponseFormat;
use crate::result::IndividualAuditResult;
use crate::verdict::ComplianceVerdict;

/// Claim-level ("total") deduction of a v2 document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTotalDeductionClassification {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "justificacion")]
    pub justification: String,
    #[serde(rename = "referencias", default)]
    pub references: Vec<String>,
}

/// Item-level ("partial") deduction of a v2 document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeductionClassification {
    #[serde(rename = "codigo")]
    pub code: i64,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "justificacion")]
    pub justification: String,
    #[serde(rename = "referencias", default)]
    pub references: Vec<String>,
}

/// A billed item of the claim
///
/// The `clasificacion_glosas` key is serialized only when the item carries a
/// partial deduction *and* at least one classification. Otherwise the key is
/// absent altogether, never `null` and never `[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ClaimItemWire")]
pub struct ClaimItem {
    #[serde(rename = "codigo")]
    code: String,
    #[serde(rename = "nombre")]
    name: String,
    #[serde(rename = "glosa_parcial")]
    has_partial_deduction: bool,
    #[serde(rename = "valor")]
    value: WholeAmount,
    #[serde(rename = "clasificacion_glosas", skip_serializing_if = "Option::is_none")]
    classifications: Option<Vec<ItemDeductionClassification>>,
}

impl ClaimItem {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        has_partial_deduction: bool,
        value: WholeAmount,
        classifications: Vec<ItemDeductionClassification>,
    ) -> Self {
        let classifications =
            (has_partial_deduction && !classifications.is_empty()).then_some(classifications);
        Self {
            code: code.into(),
            name: name.into(),
            has_partial_deduction,
            value,
            classifications,
        }
    }

    /// An item with no partial deduction
    pub fn clean(code: impl Into<String>, name: impl Into<String>, value: WholeAmount) -> Self {
        Self::new(code, name, false, value, Vec::new())
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_partial_deduction(&self) -> bool {
        self.has_partial_deduction
    }

    pub fn value(&self) -> WholeAmount {
        self.value
    }

    pub fn classifications(&self) -> &[ItemDeductionClassification] {
        self.classifications.as_deref().unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ClaimItemWire {
    codigo: String,
    nombre: String,
    glosa_parcial: bool,
    valor: WholeAmount,
    #[serde(default)]
    clasificacion_glosas: Option<Vec<ItemDeductionClassification>>,
}

impl From<ClaimItemWire> for ClaimItem {
    fn from(wire: ClaimItemWire) -> Self {
        ClaimItem::new(
            wire.codigo,
            wire.nombre,
            wire.glosa_parcial,
            wire.valor,
            wire.clasificacion_glosas.unwrap_or_default(),
        )
    }
}

/// The v2 itemized claim document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAuditDocument {
    #[serde(rename = "identificacion_reclamacion")]
    pub claim_id: String,
    #[serde(rename = "glosa_total")]
    pub has_total_deduction: bool,
    #[serde(rename = "justificacion")]
    pub justification: String,
    #[serde(rename = "clasificacion_glosas_totales", default)]
    pub total_deductions: Vec<ClaimTotalDeductionClassification>,
    #[serde(rename = "items_reclamados")]
    pub items: Vec<ClaimItem>,
}

impl ClaimAuditDocument {
    /// Conservative record returned when a v2 document cannot be produced
    ///
    /// Treats the whole claim as deducted so nothing is paid on a broken run.
    pub fn conservative_fallback(claim_id: Option<&str>, cause: &str) -> Self {
        Self {
            claim_id: claim_id.unwrap_or("error_procesamiento").to_string(),
            has_total_deduction: true,
            justification: format!("Error en el procesamiento de la auditoría: {cause}"),
            total_deductions: vec![ClaimTotalDeductionClassification {
                code: "999".to_string(),
                description: "Error de procesamiento".to_string(),
                justification: format!("Error técnico: {cause}"),
                references: Vec::new(),
            }],
            items: vec![ClaimItem::clean("ERROR_001", "Error en procesamiento", WholeAmount::zero())],
        }
    }
}

/// Version-specific part of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportPayload {
    V1 {
        individual_audits: Vec<IndividualAuditResult>,
        master_audit: Option<MasterDecision>,
    },
    V2 {
        audit_result: Option<ClaimAuditDocument>,
    },
}

impl ReportPayload {
    /// Payload of a failed run
    pub fn empty(format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::V1 => ReportPayload::V1 {
                individual_audits: Vec::new(),
                master_audit: None,
            },
            ResponseFormat::V2 => ReportPayload::V2 { audit_result: None },
        }
    }

    pub fn format(&self) -> ResponseFormat {
        match self {
            ReportPayload::V1 { .. } => ResponseFormat::V1,
            ReportPayload::V2 { .. } => ResponseFormat::V2,
        }
    }
}

/// Envelope returned for every full audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub success: bool,
    #[serde(flatten)]
    pub payload: ReportPayload,
    pub documents_retrieved: usize,
    pub model_used: String,
    pub execution_time_seconds: f64,
    pub error: Option<String>,
}

impl AuditReport {
    pub fn succeeded(
        payload: ReportPayload,
        documents_retrieved: usize,
        model_used: impl Into<String>,
        execution_time_seconds: f64,
    ) -> Self {
        Self {
            success: true,
            payload,
            documents_retrieved,
            model_used: model_used.into(),
            execution_time_seconds,
            error: None,
        }
    }

    pub fn failed(
        format: ResponseFormat,
        model_used: impl Into<String>,
        execution_time_seconds: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            payload: ReportPayload::empty(format),
            documents_retrieved: 0,
            model_used: model_used.into(),
            execution_time_seconds,
            error: Some(error.into()),
        }
    }
}

/// Answer of a single-question audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionAnswer {
    Structured {
        response: ComplianceVerdict,
        justification: String,
    },
    Text(String),
}

impl QuestionAnswer {
    fn rendered_len(&self) -> usize {
        match self {
            QuestionAnswer::Structured { response, justification } => {
                response.as_str().chars().count() + justification.chars().count()
            }
            QuestionAnswer::Text(text) => text.chars().count(),
        }
    }
}

/// Envelope returned for a single-question audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAuditReport {
    pub success: bool,
    pub answer: Option<QuestionAnswer>,
    pub context_used: String,
    pub documents_retrieved: usize,
    pub query: String,
    pub model_used: String,
    pub context_length: usize,
    pub response_length: usize,
    pub execution_time_seconds: f64,
    pub error: Option<String>,
}

impl QuestionAuditReport {
    pub fn answered(
        query: impl Into<String>,
        answer: QuestionAnswer,
        context_used: String,
        documents_retrieved: usize,
        model_used: impl Into<String>,
        execution_time_seconds: f64,
    ) -> Self {
        Self {
            success: true,
            response_length: answer.rendered_len(),
            answer: Some(answer),
            context_length: context_used.chars().count(),
            context_used,
            documents_retrieved,
            query: query.into(),
            model_used: model_used.into(),
            execution_time_seconds,
            error: None,
        }
    }

    pub fn failed(
        query: impl Into<String>,
        model_used: impl Into<String>,
        execution_time_seconds: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            answer: None,
            context_used: String::new(),
            documents_retrieved: 0,
            query: query.into(),
            model_used: model_used.into(),
            context_length: 0,
            response_length: 0,
            execution_time_seconds,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classification() -> ItemDeductionClassification {
        ItemDeductionClassification {
            code: 101,
            description: "Falta de soporte clínico".to_string(),
            justification: "Sin historia clínica".to_string(),
            references: vec!["HC.pdf/12".to_string()],
        }
    }

    #[test]
    fn test_classifications_absent_when_not_partial() {
        let item = ClaimItem::new("ITM-001", "Consulta", false, WholeAmount::new(50000), vec![classification()]);
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("clasificacion_glosas").is_none());
        assert!(item.classifications().is_empty());
    }

    #[test]
    fn test_classifications_absent_when_empty() {
        let item = ClaimItem::new("ITM-001", "Consulta", true, WholeAmount::new(50000), Vec::new());
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("clasificacion_glosas").is_none());
        assert_eq!(value["glosa_parcial"], json!(true));
    }

    #[test]
    fn test_classifications_present_when_partial() {
        let item = ClaimItem::new("ITM-002", "Radiografía", true, WholeAmount::new(80000), vec![classification()]);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["clasificacion_glosas"][0]["codigo"], json!(101));
        assert_eq!(value["valor"], json!(80000));
    }

    #[test]
    fn test_deserialization_enforces_absent_key_rule() {
        let item: ClaimItem = serde_json::from_value(json!({
            "codigo": "ITM-003",
            "nombre": "Curación",
            "glosa_parcial": false,
            "valor": 1000,
            "clasificacion_glosas": []
        }))
        .unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("clasificacion_glosas").is_none());
    }

    #[test]
    fn test_v2_envelope_shape() {
        let report = AuditReport::succeeded(
            ReportPayload::V2 {
                audit_result: Some(ClaimAuditDocument::conservative_fallback(None, "sin JSON")),
            },
            3,
            "model-x",
            1.5,
        );
        let value = serde_json::to_value(&report).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["audit_result", "documents_retrieved", "error", "execution_time_seconds", "model_used", "success"]
        );
        assert_eq!(value["audit_result"]["identificacion_reclamacion"], "error_procesamiento");
    }

    #[test]
    fn test_failed_v1_envelope_has_empty_payload() {
        let report = AuditReport::failed(ResponseFormat::V1, "model-x", 0.1, "k fuera de rango");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["individual_audits"], json!([]));
        assert!(value["master_audit"].is_null());
        assert_eq!(value["success"], json!(false));
    }
}
