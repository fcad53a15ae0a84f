//! Output formatting module
//!
//! Handles the output formats: table, CSV, JSON, YAML

mod common;
mod csv;
mod json;
mod table;

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::vipr::ResourceKind;

pub use self::common::{escape_csv, field_text, infer_columns};
pub use self::csv::CsvFormatter;
pub use self::json::{JsonFormatter, YamlFormatter};
pub use self::table::TableFormatter;

/// Trait for output formatters
pub trait Formatter {
    /// Render rows; `single` marks a lone resource rather than a listing
    fn format(&self, columns: &[String], rows: &[Value], single: bool) -> Result<String>;
}

fn formatter(format: OutputFormat) -> &'static dyn Formatter {
    match format {
        OutputFormat::Table => &TableFormatter,
        OutputFormat::Csv => &CsvFormatter,
        OutputFormat::Json => &JsonFormatter,
        OutputFormat::Yaml => &YamlFormatter,
    }
}

/// Render a scope listing (`{id, name, link}` entries)
pub fn render_listing(rows: &[Value], format: OutputFormat) -> Result<String> {
    let columns = vec!["name".to_string(), "id".to_string()];
    formatter(format).format(&columns, rows, false)
}

/// Render full representations of one kind
pub fn render_resources(kind: ResourceKind, rows: &[Value], format: OutputFormat) -> Result<String> {
    let columns: Vec<String> = kind.detail_fields().iter().map(|f| f.to_string()).collect();
    formatter(format).format(&columns, rows, rows.len() == 1)
}

/// Render one record with a fixed set of table columns
pub fn render_record(fields: &[&str], value: &Value, format: OutputFormat) -> Result<String> {
    let columns: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    formatter(format).format(&columns, std::slice::from_ref(value), true)
}

/// Render an arbitrary response body
///
/// Table and CSV show a list response's members (the single array field of
/// the body) or the body itself as one row.
pub fn render_value(value: &Value, format: OutputFormat) -> Result<String> {
    let rows = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        Value::Object(map) if matches!(format, OutputFormat::Table | OutputFormat::Csv) => {
            let mut arrays = map.values().filter_map(|v| v.as_array());
            match (arrays.next(), arrays.next(), map.len()) {
                (Some(items), None, 1) => items.clone(),
                _ => vec![value.clone()],
            }
        }
        other => vec![other.clone()],
    };

    match format {
        OutputFormat::Json | OutputFormat::Yaml if !value.is_array() => {
            formatter(format).format(&[], &[value.clone()], true)
        }
        _ => formatter(format).format(&infer_columns(&rows), &rows, false),
    }
}
