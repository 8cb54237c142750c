use serde_json::Value;

use super::RawTable;
use crate::error::{CleaningError, CleaningResult};

/// Parse a JSON array of flat objects (`[{"date": .., "GI": ..}, ..]`).
pub fn parse_records_json_str(json: &str) -> CleaningResult<RawTable> {
    let value: Value = serde_json::from_str(json)?;
    parse_records_value(&value)
}

/// Build a [`RawTable`] from already-decoded JSON records.
///
/// Headers are the union of keys in first-seen order. Absent keys and `null`
/// read as empty cells, numbers keep their JSON text, booleans and nested
/// values are rejected.
pub fn parse_records_value(value: &Value) -> CleaningResult<RawTable> {
    let records = value
        .as_array()
        .ok_or_else(|| CleaningError::Parse("expected a JSON array of records".to_string()))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or_else(|| CleaningError::Parse(format!("record {} is not a JSON object", i)))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let mut row = Vec::with_capacity(headers.len());
        for header in &headers {
            let cell = match record.get(header) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                Some(other) => {
                    return Err(CleaningError::Parse(format!(
                        "record {} field '{}' has unsupported value {}",
                        i, header, other
                    )))
                }
            };
            row.push(cell);
        }
        rows.push(row);
    }

    if headers.is_empty() || rows.is_empty() {
        return Err(CleaningError::EmptyUpload);
    }
    Ok(RawTable::new(headers, rows))
}
