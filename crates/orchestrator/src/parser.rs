//! Strict parsing of raw model output into a structured response.

use askroute_common::{AssistantError, ExternalResponse, InternalResponse, Mode, Result, StructuredResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("fence pattern is valid")
});

/// Candidate JSON texts in the order they are tried
fn candidates(raw: &str) -> Vec<&str> {
    let trimmed = raw.trim();
    let mut out = vec![trimmed];
    if let Some(body) = FENCED_JSON.captures(trimmed).and_then(|c| c.get(1)) {
        out.push(body.as_str().trim());
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            out.push(&trimmed[start..=end]);
        }
    }
    out
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let mut last_error = None;
    for candidate in candidates(raw) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(match last_error {
        Some(e) => AssistantError::schema_parse(format!("model output is not a valid response object: {}", e)),
        None => AssistantError::schema_parse("model output is empty"),
    })
}

/// Parse `raw` as the structured response for `mode`.
///
/// Accepts a bare JSON object, a fenced ```json block or the outermost `{...}`
/// span. The answer must be non-empty and an internal confidence must lie in [0, 1].
pub fn parse_structured(raw: &str, mode: Mode) -> Result<StructuredResponse> {
    let response = match mode {
        Mode::External => StructuredResponse::External(parse_json::<ExternalResponse>(raw)?),
        Mode::Internal => {
            let response = parse_json::<InternalResponse>(raw)?;
            if !(0.0..=1.0).contains(&response.confidence_score) {
                return Err(AssistantError::schema_parse(format!(
                    "confidence_score {} is outside [0, 1]",
                    response.confidence_score
                )));
            }
            StructuredResponse::Internal(response)
        }
    };

    if response.answer().trim().is_empty() {
        return Err(AssistantError::schema_parse("answer is empty"));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_json() {
        let parsed = parse_structured(r#"{"answer": "Rust is a systems language."}"#, Mode::External).unwrap();
        assert_eq!(parsed.answer(), "Rust is a systems language.");
        let StructuredResponse::External(external) = parsed else {
            panic!("expected external response");
        };
        assert!(external.web_results.is_empty());
    }

    #[test]
    fn test_fenced_json() {
        let raw = "Here you go:\n```json\n{\"answer\": \"Use cargo.\", \"confidence_score\": 0.8}\n```\nDone.";
        let parsed = parse_structured(raw, Mode::Internal).unwrap();
        assert_eq!(parsed.answer(), "Use cargo.");
        assert_eq!(parsed.mode(), Mode::Internal);
    }

    #[test]
    fn test_embedded_object() {
        let raw = "Sure! {\"answer\": \"Yes\", \"sources_used\": [\"web\"]} Hope that helps.";
        let parsed = parse_structured(raw, Mode::External).unwrap();
        assert_eq!(parsed.answer(), "Yes");
    }

    #[test]
    fn test_rejections() {
        assert!(parse_structured("I think the answer is 42", Mode::External).is_err());
        assert!(parse_structured("", Mode::External).is_err());
        assert!(parse_structured(r#"{"answer": "   "}"#, Mode::External).is_err());
        assert!(parse_structured(r#"{"answer": "x"}"#, Mode::Internal).is_err());
        assert!(parse_structured(r#"{"answer": "x", "confidence_score": 1.5}"#, Mode::Internal).is_err());
        assert!(parse_structured(r#"{"answer": "x", "confidence_score": -0.1}"#, Mode::Internal).is_err());
        assert!(parse_structured(r#"{"answer": 12}"#, Mode::External).is_err());
    }

    #[test]
    fn test_error_kind() {
        let err = parse_structured("nope", Mode::External).unwrap_err();
        assert!(matches!(err, AssistantError::SchemaParse(_)));
    }
}
