//! Table formatting using tabled
//!
//! This module renders result rows and help argument tables:
//! - Builder pattern for dynamic column sets
//! - Header row centered, optionally colored
//! - Long values wrapped to a maximum column width

use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Color, Modify, Style, object::Columns, object::Rows, width::Width},
};

use super::plain_value;
use crate::error::Result;
use crate::executor::{ArgumentDescriptor, QueryOutput};

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Table formatter for result rows
pub struct TableFormatter {
    /// Maximum column width
    max_column_width: usize,

    /// Enable colored output
    use_colors: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    ///
    /// # Arguments
    /// * `use_colors` - Enable colored header
    pub fn new(use_colors: bool) -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            use_colors,
        }
    }

    /// Set maximum column width
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Format rows as a table followed by the row count
    ///
    /// # Arguments
    /// * `output` - Rows to format
    ///
    /// # Returns
    /// * `Result<String>` - Table string
    pub fn format(&self, output: &QueryOutput) -> Result<String> {
        if output.is_empty() || output.columns.is_empty() {
            return Ok("(empty result set)".to_string());
        }

        let mut builder = Builder::default();
        builder.push_record(output.columns.clone());

        for row in &output.rows {
            let record: Vec<String> = output
                .columns
                .iter()
                .map(|column| row.get(column).map(plain_value).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }

        let mut table = builder.build();
        table.with(Style::ascii());

        // Wrap long values instead of truncating them
        for i in 0..output.columns.len() {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }

        self.style_header(&mut table);

        Ok(format!("{}\n{} row(s)", table, output.len()))
    }

    fn style_header(&self, table: &mut Table) {
        table.with(Modify::new(Rows::first()).with(Alignment::center()));
        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }
    }
}

/// Render help argument rows: name, doc, type, repeated, required
pub fn render_arguments(arguments: &[ArgumentDescriptor]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Arg", "Description", "Type", "", ""]);

    for arg in arguments {
        builder.push_record([
            arg.field_name.as_str(),
            arg.doc.as_str(),
            arg.target_type.as_str(),
            if arg.repeated { "repeated" } else { "" },
            if arg.required { "required" } else { "" },
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Row;
    use serde_json::json;

    fn output() -> QueryOutput {
        let rows: Vec<Row> = vec![
            json!({"Name": "alice", "Uid": 1000}).as_object().cloned().unwrap(),
            json!({"Name": "bob", "Shell": null}).as_object().cloned().unwrap(),
        ];
        QueryOutput::new(vec!["Name".into(), "Uid".into(), "Shell".into()], rows)
    }

    #[test]
    fn test_format_rows() {
        let text = TableFormatter::new(false).format(&output()).unwrap();
        assert!(text.contains("Name"));
        assert!(text.contains("alice"));
        assert!(text.contains("1000"));
        assert!(text.ends_with("2 row(s)"));
    }

    #[test]
    fn test_format_empty() {
        let text = TableFormatter::new(false).format(&QueryOutput::default()).unwrap();
        assert_eq!(text, "(empty result set)");
    }

    #[test]
    fn test_render_arguments() {
        let text = render_arguments(&[ArgumentDescriptor {
            field_name: "globs".into(),
            doc: "Glob patterns".into(),
            target_type: "string".into(),
            repeated: true,
            required: true,
        }]);
        assert!(text.contains("globs"));
        assert!(text.contains("Glob patterns"));
        assert!(text.contains("repeated"));
        assert!(text.contains("required"));
    }
}
