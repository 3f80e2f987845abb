//! Repair of model-emitted v2 documents
//!
//! Direct v2 generation asks the model for the final document. Its JSON is
//! close to the contract but not trustworthy: codes come back with the wrong
//! type, values carry decimals, flags arrive as strings. This module coerces
//! what it can and rejects what it cannot; a rejection is answered with
//! [`ClaimAuditDocument::conservative_fallback`].

use serde_json::{Map, Value};
use tracing::warn;

use core_kernel::WholeAmount;

use crate::error::AuditError;
use crate::parsing::extract_json_object;
use crate::report::{
    ClaimAuditDocument, ClaimItem, ClaimTotalDeductionClassification, ItemDeductionClassification,
};

const DEFAULT_CLAIM_ID: &str = "reclamacion_auditoria";
const DEFAULT_JUSTIFICATION: &str = "Auditoría procesada";
const DEFAULT_DESCRIPTION: &str = "Glosa sin descripción";
const DEFAULT_DEDUCTION_JUSTIFICATION: &str = "Sin justificación";
const DEFAULT_ITEM_CODE: &str = "ITM_001";
const DEFAULT_ITEM_NAME: &str = "Servicio médico";
const UNKNOWN_CODE: i64 = 999;

/// Repairs a raw model reply, falling back to the conservative record
pub fn repair_or_fallback(raw: &str, claim_id: Option<&str>) -> ClaimAuditDocument {
    match repair_reply(raw, claim_id) {
        Ok(document) => document,
        Err(error) => {
            warn!(error = %error, "v2 reply could not be repaired, using conservative record");
            ClaimAuditDocument::conservative_fallback(claim_id, &error.to_string())
        }
    }
}

/// Repairs a raw model reply
pub fn repair_reply(raw: &str, claim_id: Option<&str>) -> Result<ClaimAuditDocument, AuditError> {
    let object = extract_json_object(raw).map_err(|e| AuditError::format_repair(e.to_string()))?;
    repair_object(&object, claim_id)
}

/// Repairs an already decoded JSON object
pub fn repair_object(
    object: &Map<String, Value>,
    claim_id: Option<&str>,
) -> Result<ClaimAuditDocument, AuditError> {
    let claim_id = match claim_id {
        Some(id) => id.to_string(),
        None => match object.get("identificacion_reclamacion") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => DEFAULT_CLAIM_ID.to_string(),
        },
    };

    let total_deductions = objects(object.get("clasificacion_glosas_totales"))
        .map(repair_total_deduction)
        .collect::<Result<Vec<_>, _>>()?;

    let mut items = objects(object.get("items_reclamados"))
        .map(repair_item)
        .collect::<Result<Vec<_>, _>>()?;

    if items.is_empty() {
        items.push(ClaimItem::clean("ITM-001", "Servicios médicos generales", WholeAmount::zero()));
    }

    Ok(ClaimAuditDocument {
        claim_id,
        has_total_deduction: flag(object.get("glosa_total"), "glosa_total")?,
        justification: text(object.get("justificacion"), DEFAULT_JUSTIFICATION),
        total_deductions,
        items,
    })
}

fn repair_total_deduction(
    entry: &Map<String, Value>,
) -> Result<ClaimTotalDeductionClassification, AuditError> {
    let code = match entry.get("codigo") {
        None | Some(Value::Null) => UNKNOWN_CODE.to_string(),
        Some(Value::String(code)) => code.clone(),
        Some(Value::Number(code)) => code.to_string(),
        Some(other) => {
            return Err(AuditError::format_repair(format!("código de glosa total inválido: {other}")))
        }
    };

    Ok(ClaimTotalDeductionClassification {
        code,
        description: text(entry.get("descripcion"), DEFAULT_DESCRIPTION),
        justification: text(entry.get("justificacion"), DEFAULT_DEDUCTION_JUSTIFICATION),
        references: references(entry.get("referencias")),
    })
}

fn repair_item_deduction(entry: &Map<String, Value>) -> Result<ItemDeductionClassification, AuditError> {
    let code = match entry.get("codigo") {
        None | Some(Value::Null) => UNKNOWN_CODE,
        Some(value @ (Value::Number(_) | Value::String(_))) => WholeAmount::from_json(value)
            .map_err(|e| AuditError::format_repair(format!("código de glosa parcial inválido: {e}")))?
            .value(),
        Some(other) => {
            return Err(AuditError::format_repair(format!("código de glosa parcial inválido: {other}")))
        }
    };

    Ok(ItemDeductionClassification {
        code,
        description: text(entry.get("descripcion"), DEFAULT_DESCRIPTION),
        justification: text(entry.get("justificacion"), DEFAULT_DEDUCTION_JUSTIFICATION),
        references: references(entry.get("referencias")),
    })
}

fn repair_item(entry: &Map<String, Value>) -> Result<ClaimItem, AuditError> {
    let classifications = objects(entry.get("clasificacion_glosas"))
        .map(repair_item_deduction)
        .collect::<Result<Vec<_>, _>>()?;

    let value = match entry.get("valor") {
        None => WholeAmount::zero(),
        Some(value) => WholeAmount::from_json(value)?,
    };

    Ok(ClaimItem::new(
        text(entry.get("codigo"), DEFAULT_ITEM_CODE),
        text(entry.get("nombre"), DEFAULT_ITEM_NAME),
        flag(entry.get("glosa_parcial"), "glosa_parcial")?,
        value,
        classifications,
    ))
}

/// Object entries of an optional array; anything else yields nothing
fn objects(value: Option<&Value>) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn text(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => default.to_string(),
        Some(other) => other.to_string(),
    }
}

fn flag(value: Option<&Value>, field: &str) -> Result<bool, AuditError> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "si" | "sí" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(AuditError::format_repair(format!("{field} no es booleano: {other}"))),
        },
        Some(other) => Err(AuditError::format_repair(format!("{field} no es booleano: {other}"))),
    }
}

fn references(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerces_types() {
        let raw = r#"```json
        {
          "identificacion_reclamacion": "REC-1",
          "glosa_total": "false",
          "clasificacion_glosas_totales": [{"codigo": 816, "descripcion": "RUT"}],
          "items_reclamados": [
            {"codigo": "ITM-001", "nombre": "Radiografía", "glosa_parcial": 1, "valor": "80000.99",
             "clasificacion_glosas": [{"codigo": "101", "descripcion": "Sin soporte"}]}
          ]
        }
        ```"#;
        let document = repair_reply(raw, None).unwrap();

        assert_eq!(document.claim_id, "REC-1");
        assert!(!document.has_total_deduction);
        assert_eq!(document.total_deductions[0].code, "816");
        assert_eq!(document.total_deductions[0].justification, DEFAULT_DEDUCTION_JUSTIFICATION);
        assert_eq!(document.items[0].value().value(), 80000);
        assert_eq!(document.items[0].classifications()[0].code, 101);
        assert_eq!(document.justification, DEFAULT_JUSTIFICATION);
    }

    #[test]
    fn test_claim_id_override_wins() {
        let document = repair_reply(r#"{"identificacion_reclamacion": "REC-1"}"#, Some("RC-9")).unwrap();
        assert_eq!(document.claim_id, "RC-9");
    }

    #[test]
    fn test_missing_items_get_placeholder() {
        let document = repair_reply(r#"{"glosa_total": true}"#, None).unwrap();
        assert_eq!(document.claim_id, DEFAULT_CLAIM_ID);
        assert_eq!(document.items.len(), 1);
        assert_eq!(document.items[0].code(), "ITM-001");
        assert!(!document.items[0].has_partial_deduction());
    }

    #[test]
    fn test_uncoercible_value_falls_back() {
        let raw = r#"{"items_reclamados": [{"codigo": "A", "valor": "mucho"}]}"#;
        assert!(repair_reply(raw, None).is_err());

        let document = repair_or_fallback(raw, Some("RC-9"));
        assert!(document.has_total_deduction);
        assert_eq!(document.claim_id, "RC-9");
        assert_eq!(document.items[0].code(), "ERROR_001");
        assert_eq!(document.total_deductions[0].code, "999");
    }

    #[test]
    fn test_non_numeric_item_code_falls_back() {
        let raw = r#"{"items_reclamados": [{"glosa_parcial": true, "clasificacion_glosas": [{"codigo": "GT001"}]}]}"#;
        let document = repair_or_fallback(raw, None);
        assert_eq!(document.claim_id, "error_procesamiento");
    }
}
