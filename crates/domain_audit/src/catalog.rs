//! Grammar of the official deduction catalog
//!
//! The catalog is a markdown document split into sections:
//!
//! ```text
//! ### Glosa: 223 Tarifa
//! - **Tipo:** Factura
//! - **SEGMENTO:** Tarifas
//! - **Detalle de glosa:** Valor facturado superior al tarifario
//! - **Glosa a reclamacion:** Total
//! - **Contexto:** ...
//! - **Observacion:** ...
//! ```
//!
//! Only this narrow grammar is understood. Unknown lines are ignored.

use tracing::debug;

use crate::deduction::{DeductionLevel, DeductionRecord};
use crate::kind::AuditKind;

/// Section delimiter
pub const SECTION_DELIMITER: &str = "### Glosa:";

const PREFIX_KIND: &str = "- **Tipo:**";
const PREFIX_SEGMENT: &str = "- **SEGMENTO:**";
const PREFIX_DETAIL: &str = "- **Detalle de glosa:**";
const PREFIX_CLAIM_SCOPE: &str = "- **Glosa a reclamacion:**";
const PREFIX_ITEM_SCOPE: &str = "- **Glosa a ITEM:**";
const PREFIX_CONTEXT: &str = "- **Contexto:**";
const PREFIX_NOTES: &str = "- **Observacion:**";

/// Parses every well-formed section of a catalog excerpt
///
/// Text before the first delimiter is skipped. Sections without a code or a
/// detail are dropped.
pub fn parse_sections(text: &str) -> Vec<DeductionRecord> {
    text.split(SECTION_DELIMITER)
        .skip(1)
        .filter_map(parse_section)
        .collect()
}

/// Records of `kind`, matched case-insensitively on the `Tipo` field
pub fn records_for(text: &str, kind: AuditKind) -> Vec<DeductionRecord> {
    let wanted = kind.label().to_lowercase();
    parse_sections(text)
        .into_iter()
        .filter(|record| {
            let matches = record.kind.to_lowercase() == wanted;
            if !matches {
                debug!(kind = %kind, code = %record.code, tipo = %record.kind, "Skipping catalog section of another kind");
            }
            matches
        })
        .collect()
}

fn parse_section(section: &str) -> Option<DeductionRecord> {
    let section = section.trim();
    let first_line = section.lines().next().unwrap_or_default();
    let code = first_line.split_whitespace().next().unwrap_or_default().to_string();

    let mut record = DeductionRecord {
        code,
        kind: String::new(),
        segment: String::new(),
        detail: String::new(),
        scope: String::new(),
        level: DeductionLevel::Claim,
        context: String::new(),
        notes: String::new(),
    };

    for line in section.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix(PREFIX_KIND) {
            record.kind = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(PREFIX_SEGMENT) {
            record.segment = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(PREFIX_DETAIL) {
            record.detail = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(PREFIX_CLAIM_SCOPE) {
            record.scope = value.trim().to_string();
            record.level = DeductionLevel::Claim;
        } else if let Some(value) = line.strip_prefix(PREFIX_ITEM_SCOPE) {
            record.scope = value.trim().to_string();
            record.level = DeductionLevel::Item;
        } else if let Some(value) = line.strip_prefix(PREFIX_CONTEXT) {
            record.context = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix(PREFIX_NOTES) {
            record.notes = value.trim().to_string();
        }
    }

    if record.code.is_empty() || record.detail.is_empty() {
        debug!(code = %record.code, "Skipping incomplete catalog section");
        return None;
    }

    Some(record)
}
