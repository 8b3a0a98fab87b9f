// Verdict extraction from free-form model output
// Author: kelexine (https://github.com/kelexine)

use crate::error::{DetectorError, Result};
use crate::models::verdict::{Verdict, NO_REASONING};
use serde_json::{Map, Value};
use tracing::debug;

/// Parse the verdict out of the model's text answer.
///
/// The model is asked for a bare JSON object but often wraps it in prose or
/// markdown fences. The first balanced `{...}` that parses as a JSON object
/// wins. Field defaults apply only once an object has been isolated; text
/// without one is an `UnparseableResponse`.
pub fn parse_verdict(text: &str) -> Result<Verdict> {
    let object = extract_json_object(text).ok_or_else(|| {
        let preview: String = text.chars().take(200).collect();
        DetectorError::UnparseableResponse(format!("no JSON object in model output: {:?}", preview))
    })?;

    Ok(verdict_from_object(&object))
}

/// Find the first balanced JSON object in `text`.
///
/// Braces inside string literals are ignored. A balanced candidate that is
/// not valid JSON is skipped and the search resumes after its opening brace.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            let candidate = &text[start..start + end];
            match serde_json::from_str::<Value>(candidate) {
                Ok(Value::Object(map)) => return Some(map),
                Ok(_) | Err(_) => debug!("Skipping unparseable brace block at {}", start),
            }
        }
        search_from = start + 1;
    }

    None
}

/// Byte length of the balanced brace block at the start of `s`
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

fn verdict_from_object(object: &Map<String, Value>) -> Verdict {
    let detected = object
        .get("DETECTED")
        .or_else(|| object.get("detected"))
        .map(as_bool)
        .unwrap_or(false);

    let confidence = object.get("confidence").map(as_confidence).unwrap_or(0);

    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or(NO_REASONING);

    let summary = object.get("summary").and_then(Value::as_str).unwrap_or("");

    Verdict::new(detected, confidence, reasoning, summary)
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn as_confidence(value: &Value) -> u8 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}
