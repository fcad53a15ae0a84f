//! JSON and YAML output formatters
//!
//! Structured formats emit the appliance's full representations; the
//! column list only applies to tables and CSV.

use serde_json::Value;

use super::Formatter;
use crate::error::{Result, ViprError};

/// Formatter for pretty-printed JSON
pub struct JsonFormatter;

/// Formatter for YAML
pub struct YamlFormatter;

fn document(rows: &[Value], single: bool) -> Value {
    match rows {
        [only] if single => only.clone(),
        _ => Value::Array(rows.to_vec()),
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, _columns: &[String], rows: &[Value], single: bool) -> Result<String> {
        serde_json::to_string_pretty(&document(rows, single))
            .map_err(|e| ViprError::Protocol(format!("Failed to render JSON: {}", e)))
    }
}

impl Formatter for YamlFormatter {
    fn format(&self, _columns: &[String], rows: &[Value], single: bool) -> Result<String> {
        serde_yml::to_string(&document(rows, single))
            .map(|s| s.trim_end().to_string())
            .map_err(|e| ViprError::Protocol(format!("Failed to render YAML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_single_is_object() {
        let out = JsonFormatter
            .format(&[], &[json!({"name": "vol-a"})], true)
            .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"name": "vol-a"}));
    }

    #[test]
    fn test_json_list_is_array() {
        let out = JsonFormatter
            .format(&[], &[json!({"name": "vol-a"})], false)
            .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert!(parsed.is_array());
    }

    #[test]
    fn test_yaml_output() {
        let out = YamlFormatter
            .format(&[], &[json!({"name": "vol-a", "size": 1})], true)
            .unwrap();
        assert!(out.contains("name: vol-a"));
        assert!(out.contains("size: 1"));
    }
}
