//! Findings reported by special audits

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Sentinel classification for findings the system had to synthesize
pub const SENTINEL_CLASSIFICATION: &str = "999";

/// Structured finding of a special audit
///
/// Special audits decide their own deduction and report it in this shape
/// rather than through catalog records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialFindingResult {
    #[serde(rename = "identificacion_reclamacion")]
    pub claim_id: String,
    #[serde(rename = "estado_glosa", with = "flag_as_int")]
    pub has_deduction: bool,
    #[serde(rename = "justificacion")]
    pub justification: String,
    #[serde(rename = "documentos_referenciados")]
    pub referenced_documents: String,
    #[serde(rename = "clasificacion", default)]
    pub classification_code: Option<String>,
    pub description: String,
}

impl SpecialFindingResult {
    /// Finding used when the model answered but its JSON could not be read
    pub fn unreadable_reply() -> Self {
        Self {
            claim_id: "archivo_no_identificado".to_string(),
            has_deduction: true,
            justification: "Error en el procesamiento de la auditoría especial".to_string(),
            referenced_documents: "No determinado".to_string(),
            classification_code: Some(SENTINEL_CLASSIFICATION.to_string()),
            description: "Error en el análisis automatizado".to_string(),
        }
    }

    /// Finding used when the stage itself failed
    pub fn synthesized_failure(cause: &str) -> Self {
        Self {
            claim_id: "error_procesamiento".to_string(),
            has_deduction: true,
            justification: format!("Error técnico en auditoría: {cause}"),
            referenced_documents: "Sistema".to_string(),
            classification_code: Some(SENTINEL_CLASSIFICATION.to_string()),
            description: "Error técnico en el procesamiento".to_string(),
        }
    }

    /// Lenient read of a model-supplied `special_result` object
    ///
    /// `estado_glosa` may arrive as `0`/`1`, a boolean or a numeric string;
    /// `clasificacion` may be a string or a number. Missing text fields
    /// default to `No aplica`. Returns `None` when the value is not an object
    /// or the flag cannot be read.
    pub fn from_model_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let has_deduction = match object.get("estado_glosa")? {
            Value::Bool(flag) => *flag,
            Value::Number(n) => n.as_f64()? != 0.0,
            Value::String(s) => s.trim().parse::<f64>().ok()? != 0.0,
            _ => return None,
        };

        let text = |key: &str| -> String {
            match object.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "No aplica".to_string(),
                Some(other) => other.to_string(),
            }
        };

        let classification_code = match object.get("clasificacion") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Some(Self {
            claim_id: text("identificacion_reclamacion"),
            has_deduction,
            justification: text("justificacion"),
            referenced_documents: text("documentos_referenciados"),
            classification_code,
            description: text("description"),
        })
    }
}

mod flag_as_int {
    use super::*;

    pub fn serialize<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*flag))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Ok(value != 0)
    }
}
