//! JSON formatting for result rows

use colored_json::prelude::*;
use serde_json::Value;

use crate::error::Result;
use crate::executor::QueryOutput;

/// JSON formatter with pretty printing
pub struct JsonFormatter {
    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Format rows as a pretty-printed JSON array
    ///
    /// # Arguments
    /// * `output` - Rows to format
    ///
    /// # Returns
    /// * `Result<String>` - JSON string or error
    pub fn format(&self, output: &QueryOutput) -> Result<String> {
        let array = Value::Array(output.rows.iter().cloned().map(Value::Object).collect());
        let json_str = serde_json::to_string_pretty(&array)?;

        if self.use_colors {
            Ok(json_str.to_colored_json_auto().unwrap_or(json_str))
        } else {
            Ok(json_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_array() {
        let output = QueryOutput::from_rows(vec![json!({"a": 1}).as_object().cloned().unwrap()]);
        let text = JsonFormatter::new(false).format(&output).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{"a": 1}]));
    }

    #[test]
    fn test_format_empty() {
        let text = JsonFormatter::new(false).format(&QueryOutput::default()).unwrap();
        assert_eq!(text, "[]");
    }
}
