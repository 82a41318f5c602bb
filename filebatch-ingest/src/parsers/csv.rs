//! CSV parser
//!
//! Minimal comma-delimited parsing: first line is the header row, every
//! following line becomes one object keyed by header. Fields are trimmed.
//! No quoting rules; the upload boundary's 10 MiB cap bounds input size.

use super::ParseError;
use serde_json::{Map, Value};

/// Parse CSV bytes into an array of objects keyed by the header row.
///
/// Missing trailing fields default to the empty string; fields beyond the
/// header are ignored. Zero-byte or all-whitespace input is an error; a
/// header-only file parses to an empty array (the empty-result rule
/// downstream turns that into a failure).
pub fn parse_csv(bytes: &[u8]) -> Result<Value, ParseError> {
    let content = String::from_utf8_lossy(bytes);
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut lines = trimmed.split('\n');
    let headers: Vec<String> = lines
        .next()
        .unwrap_or_default()
        .split(',')
        .map(|h| h.trim().to_string())
        .collect();

    let records: Vec<Value> = lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            let mut record = Map::new();
            for (index, header) in headers.iter().enumerate() {
                let value = values.get(index).copied().unwrap_or("");
                record.insert(header.clone(), Value::String(value.to_string()));
            }
            Value::Object(record)
        })
        .collect();

    Ok(Value::Array(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_and_one_row() {
        let result = parse_csv(b"a,b\n1,2").unwrap();
        assert_eq!(result, json!([{"a": "1", "b": "2"}]));
    }

    #[test]
    fn fields_are_trimmed() {
        let result = parse_csv(b" a , b \n 1 , 2 ").unwrap();
        assert_eq!(result, json!([{"a": "1", "b": "2"}]));
    }

    #[test]
    fn missing_trailing_fields_default_to_empty() {
        let result = parse_csv(b"a,b,c\n1,2").unwrap();
        assert_eq!(result, json!([{"a": "1", "b": "2", "c": ""}]));
    }

    #[test]
    fn extra_fields_beyond_header_are_ignored() {
        let result = parse_csv(b"a\n1,2,3").unwrap();
        assert_eq!(result, json!([{"a": "1"}]));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse_csv(b"").unwrap_err(), ParseError::EmptyInput));
        assert!(matches!(
            parse_csv(b"  \n  ").unwrap_err(),
            ParseError::EmptyInput
        ));
    }

    #[test]
    fn header_only_parses_to_empty_array() {
        // Classified as a failure later by the empty-result rule
        assert_eq!(parse_csv(b"a,b").unwrap(), json!([]));
    }

    #[test]
    fn windows_line_endings() {
        let result = parse_csv(b"a,b\r\n1,2\r\n").unwrap();
        assert_eq!(result, json!([{"a": "1", "b": "2"}]));
    }
}
