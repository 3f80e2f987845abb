//! Deduction ("glosa") records from the official catalog

use serde::{Deserialize, Serialize};

/// Whether a catalog deduction applies to the whole claim or to a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeductionLevel {
    #[default]
    Claim,
    Item,
}

/// One deduction entry extracted from the catalog
///
/// Records are read-only once extracted; they are only ever attached to
/// results and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRecord {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "segmento")]
    pub segment: String,
    #[serde(rename = "detalle")]
    pub detail: String,
    #[serde(rename = "glosa_a_reclamacion")]
    pub scope: String,
    #[serde(skip)]
    pub level: DeductionLevel,
    #[serde(rename = "contexto")]
    pub context: String,
    #[serde(rename = "observaciones")]
    pub notes: String,
}

impl DeductionRecord {
    /// Catalog codes start with the numeric classification (`"816 RUT"`)
    ///
    /// Returns the leading digits as an integer, if any.
    pub fn numeric_code(&self) -> Option<i64> {
        let digits: String = self
            .code
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// Segment name, or `General` when the catalog left it empty
    pub fn segment_or_general(&self) -> &str {
        if self.segment.trim().is_empty() {
            "General"
        } else {
            &self.segment
        }
    }
}
