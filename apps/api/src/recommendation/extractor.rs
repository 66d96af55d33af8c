//! Response Extractor — pulls a JSON payload out of free-form generator output.
//!
//! Order of attempts:
//! 1. the whole trimmed text (with a surrounding code fence stripped, if any);
//! 2. the span from the first opening bracket of the expected kind to the *last*
//!    closing bracket of the same kind.
//!
//! Known limitation: step 2 is a heuristic, not a tokenizer. Prose that contains
//! a stray closing bracket after the real payload widens the slice and the parse
//! fails; it is reported as malformed output rather than guessed at.

use serde_json::Value;
use thiserror::Error;

/// Top-level JSON kind a caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn brackets(self) -> (char, char) {
        match self {
            JsonShape::Object => ('{', '}'),
            JsonShape::Array => ('[', ']'),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JsonShape::Object => "object",
            JsonShape::Array => "array",
        }
    }
}

/// Extraction failure. Always carries the untouched raw text so it can be
/// surfaced (truncated) for diagnostics.
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct ExtractionError {
    pub detail: String,
    pub raw: String,
}

/// Extracts a JSON value from raw generator output.
///
/// The returned value is whatever parsed; the top-level kind is checked by the
/// schema completer, not here.
pub fn extract_json(raw: &str, shape: JsonShape) -> Result<Value, ExtractionError> {
    let fail = |detail: String| ExtractionError {
        detail,
        raw: raw.to_string(),
    };

    let text = raw.trim();
    if text.is_empty() {
        return Err(fail("generator returned no output".to_string()));
    }

    let direct_error = match serde_json::from_str::<Value>(strip_json_fences(text)) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let (open, close) = shape.brackets();
    let Some(start) = text.find(open) else {
        return Err(fail(format!(
            "no JSON {} found in output (no '{open}'); direct parse failed: {direct_error}",
            shape.name()
        )));
    };
    let end = match text.rfind(close) {
        Some(end) if end > start => end,
        _ => {
            return Err(fail(format!(
                "no JSON {} found in output (no '{close}' after '{open}')",
                shape.name()
            )))
        }
    };

    serde_json::from_str::<Value>(&text[start..=end]).map_err(|e| {
        fail(format!(
            "embedded JSON {} did not parse: {e}",
            shape.name()
        ))
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from generator output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
