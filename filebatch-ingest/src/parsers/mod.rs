//! Format parsers
//!
//! Pure functions turning raw bytes plus a declared media type into a
//! structured record set (`serde_json::Value`). Parsers never perform I/O;
//! callers hand them already-read content. Dispatch is by media type with
//! any parameters (`; charset=...`) stripped first.

mod csv;
mod json;
mod text;

pub use csv::parse_csv;
pub use json::parse_json;
pub use text::parse_text;

use serde_json::Value;
use thiserror::Error;

/// Media types the pipeline understands
pub const MEDIA_TYPE_JSON: &str = "application/json";
pub const MEDIA_TYPE_CSV: &str = "text/csv";
pub const MEDIA_TYPE_TEXT: &str = "text/plain";

/// Parser errors; always local to a single item
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed JSON, with the decoder diagnostic
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Zero-byte or all-whitespace input where content is required
    #[error("empty input")]
    EmptyInput,

    /// Declared media type has no registered parser
    #[error("unsupported media type: {0}")]
    UnsupportedType(String),
}

/// Parse `bytes` according to the declared media type
pub fn parse(bytes: &[u8], media_type: &str) -> Result<Value, ParseError> {
    match essence(media_type) {
        MEDIA_TYPE_JSON => parse_json(bytes),
        MEDIA_TYPE_CSV => parse_csv(bytes),
        MEDIA_TYPE_TEXT => parse_text(bytes),
        other => Err(ParseError::UnsupportedType(other.to_string())),
    }
}

/// Whether the media type is one the pipeline accepts
pub fn is_supported(media_type: &str) -> bool {
    matches!(
        essence(media_type),
        MEDIA_TYPE_JSON | MEDIA_TYPE_CSV | MEDIA_TYPE_TEXT
    )
}

/// Number of records in a parsed value: array length, otherwise 1
pub fn record_count(value: &Value) -> i64 {
    match value {
        Value::Array(items) => items.len() as i64,
        _ => 1,
    }
}

/// Structurally-empty results are failures, not zero-record successes.
/// Null and the empty array qualify; scalar values do not.
pub fn is_structurally_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Strip media-type parameters: `text/csv; charset=utf-8` -> `text/csv`
fn essence(media_type: &str) -> &str {
    media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
}
