//! Consolidated adjudication decision

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final decision over the whole claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Every audit complied
    #[serde(rename = "Aprobada total")]
    Approved,
    /// Some audits failed but the claim can be paid with deductions
    #[serde(rename = "Aprobada parcial")]
    PartiallyApproved,
    /// Returned to the provider
    #[serde(rename = "Devuelta")]
    Returned,
    /// Voided; never produced by the consolidation rule
    #[serde(rename = "Anulada")]
    Voided,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Approved => "Aprobada total",
            DecisionKind::PartiallyApproved => "Aprobada parcial",
            DecisionKind::Returned => "Devuelta",
            DecisionKind::Voided => "Anulada",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the master audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDecision {
    pub decision: DecisionKind,
    /// One line per merged deduction
    pub glosas: String,
    pub justification: String,
}

impl MasterDecision {
    /// Decision returned when consolidation itself fails
    pub fn consolidation_failure(cause: &str) -> Self {
        Self {
            decision: DecisionKind::Returned,
            glosas: "Error en procesamiento de auditoría maestra".to_string(),
            justification: format!("Error en auditoría maestra: {cause}"),
        }
    }
}
