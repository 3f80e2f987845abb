//! Compliance verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceVerdict {
    #[serde(rename = "Cumple")]
    Cumple,
    #[serde(rename = "No cumple")]
    NoCumple,
}

impl ComplianceVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceVerdict::Cumple => "Cumple",
            ComplianceVerdict::NoCumple => "No cumple",
        }
    }

    pub fn is_compliant(&self) -> bool {
        matches!(self, ComplianceVerdict::Cumple)
    }

    /// Lenient reading of a model-supplied verdict
    ///
    /// Case and inner whitespace are ignored (`"NO  CUMPLE"`, `"no_cumple"`).
    /// Returns `None` for anything outside the two-word vocabulary.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let normalized = raw
            .trim()
            .to_lowercase()
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "cumple" => Some(ComplianceVerdict::Cumple),
            "no cumple" => Some(ComplianceVerdict::NoCumple),
            _ => None,
        }
    }
}

impl fmt::Display for ComplianceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form() {
        assert_eq!(serde_json::to_string(&ComplianceVerdict::NoCumple).unwrap(), "\"No cumple\"");
        let parsed: ComplianceVerdict = serde_json::from_str("\"Cumple\"").unwrap();
        assert_eq!(parsed, ComplianceVerdict::Cumple);
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(ComplianceVerdict::parse_lenient(" cumple "), Some(ComplianceVerdict::Cumple));
        assert_eq!(ComplianceVerdict::parse_lenient("NO  CUMPLE"), Some(ComplianceVerdict::NoCumple));
        assert_eq!(ComplianceVerdict::parse_lenient("no_cumple"), Some(ComplianceVerdict::NoCumple));
        assert_eq!(ComplianceVerdict::parse_lenient("parcial"), None);
        assert_eq!(ComplianceVerdict::parse_lenient(""), None);
    }
}
