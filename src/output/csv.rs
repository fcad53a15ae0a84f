//! CSV output formatter

use serde_json::Value;

use super::common::{escape_csv, field_text};
use super::Formatter;
use crate::error::Result;

/// Formatter for CSV output
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, columns: &[String], rows: &[Value], _single: bool) -> Result<String> {
        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(columns.join(","));
        for row in rows {
            let fields: Vec<String> = columns
                .iter()
                .map(|c| escape_csv(&field_text(row, c)))
                .collect();
            lines.push(fields.join(","));
        }
        Ok(lines.join("\n"))
    }
}
