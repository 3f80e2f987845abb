//! Tolerant reading of model replies
//!
//! Model output is untrusted text. A reply is read in tiers:
//!
//! 1. **Parsed**: a JSON object (fenced ```` ```json ```` block or the
//!    outermost `{…}` span) with a recognisable `response`.
//! 2. **FallbackParsed**: the raw text is scanned for the verdict words.
//! 3. **Failed**: the stage never produced a reply (model error, timeout,
//!    panic); assigned by the runner, never by this module.
//!
//! Parse failures are values here, never errors.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AuditError;
use crate::finding::SpecialFindingResult;
use crate::kind::AuditKind;
use crate::verdict::ComplianceVerdict;

/// Characters of raw reply kept as justification by the text scan
pub const FALLBACK_JUSTIFICATION_CHARS: usize = 1000;

const MISSING_JUSTIFICATION: &str = "Error en el análisis";

/// Which tier produced a stage result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseOutcome {
    Parsed,
    FallbackParsed,
    Failed,
}

/// Verdict and supporting text read from a model reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub outcome: ParseOutcome,
    pub verdict: ComplianceVerdict,
    pub justification: String,
    pub special_finding: Option<SpecialFindingResult>,
}

/// Reads a reply for `kind`, falling back to the text scan
pub fn parse_audit_reply(raw: &str, kind: AuditKind) -> ParsedReply {
    match parse_structured(raw, kind) {
        Ok(reply) => reply,
        Err(error) => {
            debug!(kind = %kind, error = %error, "Structured parse failed, scanning text");
            fallback_scan(raw, kind)
        }
    }
}

/// Reads a verdict reply that is not tied to an audit kind
pub fn parse_verdict_reply(raw: &str) -> ParsedReply {
    match read_structured(raw, false) {
        Ok(reply) => reply,
        Err(error) => {
            debug!(error = %error, "Structured parse failed, scanning text");
            scan_text(raw, false)
        }
    }
}

/// Tier 1: structured JSON reading
pub fn parse_structured(raw: &str, kind: AuditKind) -> Result<ParsedReply, AuditError> {
    read_structured(raw, kind.is_special())
}

fn read_structured(raw: &str, expects_finding: bool) -> Result<ParsedReply, AuditError> {
    let object = extract_json_object(raw)?;

    let verdict = match object.get("response") {
        Some(Value::String(text)) => ComplianceVerdict::parse_lenient(text)
            .ok_or_else(|| AuditError::parse(format!("respuesta fuera de vocabulario: {text}")))?,
        Some(other) => return Err(AuditError::parse(format!("respuesta no textual: {other}"))),
        None => return Err(AuditError::parse("falta el campo response")),
    };

    let justification = match object.get("justification") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::Null) | None => MISSING_JUSTIFICATION.to_string(),
        Some(other) => other.to_string(),
    };

    let special_finding = if expects_finding {
        match object.get("special_result") {
            Some(Value::Null) | None => None,
            Some(value) => Some(
                SpecialFindingResult::from_model_value(value)
                    .ok_or_else(|| AuditError::parse("special_result ilegible"))?,
            ),
        }
    } else {
        None
    };

    Ok(ParsedReply {
        outcome: ParseOutcome::Parsed,
        verdict,
        justification,
        special_finding,
    })
}

/// Tier 2: verdict words scanned from the raw text
///
/// Matching is case-insensitive and on whole words. A negated "cumple"
/// ("no cumple", "no se cumple") or any "incumpl..." word makes the reply
/// non-compliant even when a bare "cumple" also occurs; a reply with no
/// verdict word is non-compliant too.
pub fn fallback_scan(raw: &str, kind: AuditKind) -> ParsedReply {
    scan_text(raw, kind.is_special())
}

fn scan_text(raw: &str, expects_finding: bool) -> ParsedReply {
    let text = raw.trim();
    let verdict = scan_verdict(text);

    ParsedReply {
        outcome: ParseOutcome::FallbackParsed,
        verdict,
        justification: truncate_with_ellipsis(text, FALLBACK_JUSTIFICATION_CHARS),
        special_finding: expects_finding.then(SpecialFindingResult::unreadable_reply),
    }
}

fn scan_verdict(text: &str) -> ComplianceVerdict {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let negated = words.iter().enumerate().any(|(i, word)| {
        word.starts_with("incumpl")
            || (*word == "cumple" && matches!(&words[..i], [.., "no"] | [.., "no", "se"]))
    });

    if negated || !words.contains(&"cumple") {
        ComplianceVerdict::NoCumple
    } else {
        ComplianceVerdict::Cumple
    }
}

/// Locates and decodes the JSON object inside a reply
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>, AuditError> {
    let candidate = fenced_json(raw)
        .or_else(|| outer_braces(raw))
        .ok_or_else(|| AuditError::parse("no se encontró un objeto JSON"))?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuditError::parse("el JSON no es un objeto")),
        Err(e) => Err(AuditError::parse(e.to_string())),
    }
}

/// Keeps the first `max` characters, appending `...` when cut
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn fenced_json(raw: &str) -> Option<&str> {
    let start = raw.find("```json")? + "```json".len();
    let len = raw[start..].find("```")?;
    let body = raw[start..start + len].trim();
    body.starts_with('{').then_some(body)
}

fn outer_braces(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
