//! Common utilities for output formatters

use serde_json::Value;

/// Escape a value for CSV output
/// Handles commas, quotes, and newlines according to RFC 4180
pub fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Flatten one field of a resource representation to display text.
///
/// Related resources (`{"id", "name", "link"}`) show their name, or their
/// id when unnamed. Lists are comma-joined.
pub fn field_text(resource: &Value, field: &str) -> String {
    resource.get(field).map(value_text).unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => match (map.get("name"), map.get("id")) {
            (Some(Value::String(name)), _) if !name.is_empty() => name.clone(),
            (_, Some(Value::String(id))) => id.clone(),
            _ => value.to_string(),
        },
    }
}

/// Column names for arbitrary objects: the keys of the first row
pub fn infer_columns(rows: &[Value]) -> Vec<String> {
    rows.iter()
        .find_map(|row| row.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}
