//! JSON parser

use super::ParseError;
use serde_json::Value;

/// Decode bytes as JSON and return the value as-is.
///
/// Objects, arrays and scalars are all accepted here; the empty-result rule
/// (null, `[]`) is applied by the item processor, not the parser.
pub fn parse_json(bytes: &[u8]) -> Result<Value, ParseError> {
    let value = serde_json::from_slice(bytes)?;
    Ok(value)
}
