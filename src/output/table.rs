//! Table output formatter

use comfy_table::{presets::NOTHING, Table};
use serde_json::Value;

use super::common::field_text;
use super::Formatter;
use crate::error::Result;

/// Formatter for borderless table output
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format(&self, columns: &[String], rows: &[Value], _single: bool) -> Result<String> {
        let mut table = Table::new();
        table
            .load_preset(NOTHING)
            .set_header(columns.iter().map(|c| header_label(c)));

        for row in rows {
            table.add_row(columns.iter().map(|c| field_text(row, c)));
        }

        Ok(table.to_string())
    }
}

/// "provisioned_capacity_gb" -> "Provisioned Capacity Gb"
fn header_label(column: &str) -> String {
    column
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
