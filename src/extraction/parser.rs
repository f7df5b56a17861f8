//! Response parsing and repair
//!
//! Models do not always answer with bare JSON. Text that decodes as a whole
//! is used as is. Otherwise the payload is located with, in order: a fence
//! labeled exactly `json`, any fence, the span from the first `{` to the last
//! `}`, or the raw text. The decoded value is then normalized
//! into an [`ExtractionResult`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::ParseError;
use super::{ExtractionResult, Record};

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\b(.*?)(?:```|\z)").expect("valid fence pattern"));

static ANY_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+.-]*(.*?)(?:```|\z)").expect("valid fence pattern")
});

/// Pick the part of the model output that should hold the JSON payload
pub fn select_payload(raw: &str) -> &str {
    for fence in [&*JSON_FENCE, &*ANY_FENCE] {
        if let Some(body) = fence.captures(raw).and_then(|c| c.get(1)) {
            return body.as_str().trim();
        }
    }

    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize a decoded value into listings
pub fn normalize(value: Value) -> Result<ExtractionResult, ParseError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => return Err(ParseError::NotAnObject(json_kind(&other))),
    };

    let Some(listings) = map.remove("listings") else {
        // A bare record instead of the requested envelope
        return Ok(ExtractionResult {
            listings: vec![map],
            extra: Record::new(),
        });
    };

    let Value::Array(items) = listings else {
        return Err(ParseError::ListingsNotArray);
    };

    let total = items.len();
    let listings: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect();
    if listings.len() < total {
        debug!("Dropped {} non-object listings", total - listings.len());
    }

    Ok(ExtractionResult {
        listings,
        extra: map,
    })
}

/// Parse model output, reporting why it could not be used
pub fn try_parse_response(raw: &str) -> Result<ExtractionResult, ParseError> {
    // Fences inside string values must not be mistaken for a wrapper
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return normalize(value);
    }

    let payload = select_payload(raw);
    let value: Value = serde_json::from_str(payload)?;
    normalize(value)
}

/// Parse model output; anything unusable becomes empty listings
pub fn parse_response(raw: &str) -> ExtractionResult {
    try_parse_response(raw).unwrap_or_else(|e| {
        warn!("Could not parse model response: {}", e);
        ExtractionResult::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listings_json(result: &ExtractionResult) -> Value {
        serde_json::to_value(result).unwrap()
    }

    #[test]
    fn test_json_fence() {
        let result = parse_response("```json\n{\"listings\":[{\"a\":\"1\"}]}\n```");
        assert_eq!(listings_json(&result), json!({"listings": [{"a": "1"}]}));
    }

    #[test]
    fn test_json_fence_with_prose() {
        let raw = "Here you go:\n```JSON\n{\"listings\":[{\"a\":\"1\"}]}\n```\nLet me know!";
        let result = parse_response(raw);
        assert_eq!(result.listings.len(), 1);
        assert_eq!(result.listings[0]["a"], "1");
    }

    #[test]
    fn test_json_fence_preferred_over_earlier_fence() {
        let raw = "```text\nnot this\n```\n```json\n{\"listings\":[{\"b\":\"2\"}]}\n```";
        let result = parse_response(raw);
        assert_eq!(result.listings[0]["b"], "2");
    }

    #[test]
    fn test_generic_fence() {
        let result = parse_response("```\n{\"listings\":[{\"a\":\"1\"}]}\n```");
        assert_eq!(result.listings[0]["a"], "1");

        let result = parse_response("```javascript\n{\"listings\":[{\"a\":\"2\"}]}\n```");
        assert_eq!(result.listings[0]["a"], "2");
    }

    #[test]
    fn test_json_label_variants_use_generic_fence() {
        let raw = "```jsonc\n{\"listings\":[{\"a\":\"1\"}]}\n```";
        assert!(JSON_FENCE.captures(raw).is_none());
        assert_eq!(parse_response(raw).listings[0]["a"], "1");

        let raw = "```json5\n{\"listings\":[{\"a\":\"2\"}]}\n```";
        assert!(JSON_FENCE.captures(raw).is_none());
        assert_eq!(parse_response(raw).listings[0]["a"], "2");
    }

    #[test]
    fn test_fence_inside_string_value() {
        let raw = r#"{"listings":[{"a":"\u0060\u0060\u0060json {\"x\":1} \u0060\u0060\u0060"}]}"#;
        let result = parse_response(raw);
        assert_eq!(result.listings.len(), 1);
        assert_eq!(result.listings[0]["a"], "```json {\"x\":1} ```");

        let dumped = serde_json::to_string(&result).unwrap();
        assert_eq!(parse_response(&dumped), result);
    }

    #[test]
    fn test_unclosed_fence() {
        let result = parse_response("```json\n{\"listings\":[{\"a\":\"1\"}]}");
        assert_eq!(result.listings.len(), 1);
    }

    #[test]
    fn test_brace_span() {
        let raw = "Sure! {\"listings\": [{\"name\": \"x\"}]} Hope that helps.";
        let result = parse_response(raw);
        assert_eq!(result.listings[0]["name"], "x");
    }

    #[test]
    fn test_bare_record_is_wrapped() {
        let result = parse_response("{\"a\":\"1\"}");
        assert_eq!(listings_json(&result), json!({"listings": [{"a": "1"}]}));
    }

    #[test]
    fn test_not_json() {
        let result = parse_response("not json at all");
        assert_eq!(listings_json(&result), json!({"listings": []}));
        assert!(matches!(
            try_parse_response("not json at all"),
            Err(ParseError::Decode(_))
        ));
    }

    #[test]
    fn test_non_object_values() {
        assert!(matches!(
            try_parse_response("[1, 2]"),
            Err(ParseError::NotAnObject("an array"))
        ));
        assert!(parse_response("42").listings.is_empty());
        assert!(matches!(
            try_parse_response("{\"listings\": \"none\"}"),
            Err(ParseError::ListingsNotArray)
        ));
    }

    #[test]
    fn test_non_object_listings_are_dropped() {
        let result = parse_response("{\"listings\": [{\"a\": \"1\"}, \"junk\", 3, null]}");
        assert_eq!(listings_json(&result), json!({"listings": [{"a": "1"}]}));
    }

    #[test]
    fn test_extra_keys_are_kept() {
        let result = parse_response("{\"listings\": [], \"page\": 2}");
        assert!(result.listings.is_empty());
        assert_eq!(listings_json(&result), json!({"listings": [], "page": 2}));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "```json\n{\"listings\":[{\"a\":\"1\"}]}\n```",
            "{\"a\":\"1\"}",
            "not json at all",
            "{\"listings\": [{\"a\": null}, 7], \"note\": \"x\"}",
            "{}",
            "prefix {\"listings\": [{\"nested\": {\"k\": [1, 2]}}]} suffix",
            "```\n[1,2,3]\n```",
            r#"{"listings":[{"a":"\u0060\u0060\u0060json {\"x\":1} \u0060\u0060\u0060"}]}"#,
        ];

        for raw in inputs {
            let once = parse_response(raw);
            let dumped = serde_json::to_string(&once).unwrap();
            let twice = parse_response(&dumped);
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }
}
