//! Resilient JSON decoding of chat-completion output.
//!
//! The endpoint is asked for JSON but sometimes wraps it in Markdown fences
//! or surrounds it with prose. Three attempts, strictly in order, first
//! success wins:
//!   1. strict parse of the raw text
//!   2. strip "```json" / "```" markers, trim, strict parse
//!   3. strict parse of the span from the first `{` to the last `}`
//!
//! Step 3 is greedy on purpose: two sibling objects collapse into one span,
//! which normally fails to parse and falls through to the sentinel.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Message carried by the sentinel error object.
pub const DECODE_ERROR_MESSAGE: &str = "JSON 解析失败";

/// All three salvage attempts failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("JSON 解析失败")]
pub struct DecodeError {
    /// The original, unmodified model output.
    pub raw_content: String,
}

impl DecodeError {
    pub fn new(raw_content: impl Into<String>) -> Self {
        Self {
            raw_content: raw_content.into(),
        }
    }

    /// `{"error": "JSON 解析失败", "raw_content": <raw>}`
    pub fn to_sentinel(&self) -> Value {
        json!({
            "error": DECODE_ERROR_MESSAGE,
            "raw_content": self.raw_content,
        })
    }
}

/// First `{` to last `}`, newlines included.
fn brace_span() -> &'static Regex {
    static BRACE_SPAN: OnceLock<Regex> = OnceLock::new();
    BRACE_SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// Remove Markdown code-fence markers and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Decode model output into a JSON value.
pub fn decode(raw: &str) -> Result<Value, DecodeError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        log::debug!("[DECODE] Direct parse succeeded");
        return Ok(value);
    }

    let stripped = strip_code_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
        log::debug!("[DECODE] Parsed after fence stripping");
        return Ok(value);
    }

    if let Some(span) = brace_span().find(&stripped) {
        if let Ok(value) = serde_json::from_str::<Value>(span.as_str()) {
            log::debug!(
                "[DECODE] Salvaged brace span {}..{} of {} chars",
                span.start(),
                span.end(),
                stripped.len()
            );
            return Ok(value);
        }
    }

    log::warn!(
        "[DECODE] All salvage attempts failed — raw: {}",
        raw.chars().take(200).collect::<String>()
    );
    Err(DecodeError::new(raw))
}

/// Decode, or return the sentinel error object in place of the value.
pub fn decode_or_sentinel(raw: &str) -> Value {
    decode(raw).unwrap_or_else(|e| e.to_sentinel())
}
