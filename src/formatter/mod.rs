//! Output formatting for statement results
//!
//! This module renders the rows produced by a statement in the format chosen
//! at startup:
//! - Text tables (tabled)
//! - Pretty JSON arrays, optionally colored
//! - CSV with a header row

pub mod csv;
pub mod json;
pub mod table;

use serde_json::Value;

use crate::config::{ConsoleSettings, OutputFormat};
use crate::error::Result;
use crate::executor::QueryOutput;

pub use csv::CsvFormatter;
pub use json::JsonFormatter;
pub use table::TableFormatter;

/// Main formatter for statement results
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    /// Enable colored output
    use_colors: bool,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `format_type` - Output format type
    /// * `use_colors` - Enable colored output
    ///
    /// # Returns
    /// * `Self` - New formatter instance
    pub fn new(format_type: OutputFormat, use_colors: bool) -> Self {
        Self {
            format_type,
            use_colors,
        }
    }

    /// Create a formatter from console settings
    pub fn from_settings(settings: &ConsoleSettings) -> Self {
        Self::new(settings.format, settings.color_output)
    }

    /// Format rows according to the configured format
    ///
    /// # Arguments
    /// * `output` - Rows to format
    ///
    /// # Returns
    /// * `Result<String>` - Formatted output or error
    pub fn format(&self, output: &QueryOutput) -> Result<String> {
        match self.format_type {
            OutputFormat::Text => TableFormatter::new(self.use_colors).format(output),
            OutputFormat::Json => JsonFormatter::new(self.use_colors).format(output),
            OutputFormat::Csv => Ok(CsvFormatter::new().format(output)),
        }
    }
}

/// Render a cell value as plain text.
///
/// Strings are shown without quotes and null as an empty cell; everything
/// else is compact JSON.
pub fn plain_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_value() {
        assert_eq!(plain_value(&json!("text")), "text");
        assert_eq!(plain_value(&json!(null)), "");
        assert_eq!(plain_value(&json!(42)), "42");
        assert_eq!(plain_value(&json!(true)), "true");
        assert_eq!(plain_value(&json!({"k": "v"})), r#"{"k":"v"}"#);
    }

    #[test]
    fn test_dispatch_by_format() {
        let output = QueryOutput::from_rows(vec![json!({"a": 1}).as_object().cloned().unwrap()]);

        let csv = Formatter::new(OutputFormat::Csv, false).format(&output).unwrap();
        assert_eq!(csv, "a\n1");

        let json = Formatter::new(OutputFormat::Json, false).format(&output).unwrap();
        assert!(json.starts_with('['));

        let text = Formatter::new(OutputFormat::Text, false).format(&output).unwrap();
        assert!(text.ends_with("1 row(s)"));
    }
}
