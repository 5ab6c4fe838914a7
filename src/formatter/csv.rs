//! CSV formatting for result rows
//!
//! A header row is written first, then one line per row with values escaped
//! when they contain a comma, quote or line break.

use super::plain_value;
use crate::executor::QueryOutput;

/// Formatter for CSV output
#[derive(Debug, Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Format rows as CSV
    ///
    /// # Arguments
    /// * `output` - Rows to format
    ///
    /// # Returns
    /// * `String` - Header line plus one line per row
    pub fn format(&self, output: &QueryOutput) -> String {
        if output.columns.is_empty() {
            return String::new();
        }

        let mut lines = Vec::with_capacity(output.rows.len() + 1);
        lines.push(
            output
                .columns
                .iter()
                .map(|c| escape_csv_value(c))
                .collect::<Vec<_>>()
                .join(","),
        );

        for row in &output.rows {
            let values: Vec<String> = output
                .columns
                .iter()
                .map(|column| {
                    let value = row.get(column).map(plain_value).unwrap_or_default();
                    escape_csv_value(&value)
                })
                .collect();
            lines.push(values.join(","));
        }

        lines.join("\n")
    }
}

/// Escape a CSV value if necessary
///
/// # Arguments
/// * `value` - Value to escape
///
/// # Returns
/// * `String` - Escaped value
fn escape_csv_value(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        // Wrap in quotes and escape internal quotes by doubling them
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
