//! JSON transcript format: an array of `{ role, content }` objects.

use crate::error::FormatError;
use log::debug;
use serde_json::{Map, Value};
use wand_rs_protocol::{Record, Role};

/// Parse uploaded bytes into records, preserving input order.
///
/// Extra keys on each object are ignored; `role` must name one of the closed
/// set of roles and `content` must be a string.
pub fn parse_records(raw: &[u8]) -> Result<Vec<Record>, FormatError> {
    let text = std::str::from_utf8(raw)?;
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(FormatError::NotASequence {
                found: json_kind(&other),
            });
        }
    };

    let records = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let object = item
                .as_object()
                .ok_or(FormatError::NotAnObject { position })?;
            let role = string_field(object, position, "role")?
                .parse::<Role>()
                .map_err(|source| FormatError::UnknownRole { position, source })?;
            let content = string_field(object, position, "content")?;
            Ok(Record::new(role, content))
        })
        .collect::<Result<Vec<_>, FormatError>>()?;
    debug!("parsed records (count={}, bytes={})", records.len(), raw.len());
    Ok(records)
}

/// Render records back into the upload format.
pub fn render_records(records: &[Record]) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    position: usize,
    field: &'static str,
) -> Result<&'a str, FormatError> {
    match object.get(field) {
        None => Err(FormatError::MissingField { position, field }),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(FormatError::WrongType { position, field }),
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
