//! Plain-text parser

use super::ParseError;
use serde_json::{json, Value};

/// Parse text bytes into `{lineNumber, content}` records.
///
/// Blank lines are dropped, not counted: line numbers are 1-indexed over the
/// retained lines. Content is trimmed.
pub fn parse_text(bytes: &[u8]) -> Result<Value, ParseError> {
    let content = String::from_utf8_lossy(bytes);

    let records: Vec<Value> = content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            json!({
                "lineNumber": index + 1,
                "content": line,
            })
        })
        .collect();

    Ok(Value::Array(records))
}
