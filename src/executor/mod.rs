//! Statement execution for the console
//!
//! This module provides the layer between an accepted line and the external
//! query evaluator:
//! - Statement router that dispatches lines by their leading keyword
//! - Help resolver for functions, plugins and artifacts
//! - Cancellation controller binding each statement to an interrupt listener
//! - The `Evaluator` contract and the rows it produces

pub mod cancel;
pub mod help;
pub mod router;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

pub use cancel::{CancellationController, CtrlCInterrupt, InterruptSource, ManualInterrupt};
pub use help::{ArgumentDescriptor, EntryHelp, HelpResolver, HelpTopic, TagSet};
pub use router::{DispatchOutcome, KeywordTable, Route, StatementRouter};

/// One result row, keyed by column name
pub type Row = Map<String, Value>;

/// Rows produced by a statement, with their column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Column names in display order
    pub columns: Vec<String>,

    /// Result rows
    pub rows: Vec<Row>,
}

impl QueryOutput {
    /// Create an output with explicit column order
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Create an output whose columns are the keys of the rows, in first-seen order
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// External query evaluator.
///
/// Implementations must check `cancel` cooperatively and return
/// `ExecutionError::Cancelled` once it fires.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate one `SELECT` or `LET` statement
    ///
    /// # Arguments
    /// * `statement` - Statement text as typed
    /// * `cancel` - Token cancelled when the user interrupts the statement
    ///
    /// # Returns
    /// * `Result<QueryOutput>` - Rows produced, or an error
    async fn evaluate(&self, statement: &str, cancel: CancellationToken) -> Result<QueryOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_rows_collects_columns() {
        let output = QueryOutput::from_rows(vec![
            row(json!({"a": 1, "b": 2})),
            row(json!({"b": 3, "c": 4})),
        ]);
        assert_eq!(output.columns, vec!["a", "b", "c"]);
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_empty_output() {
        let output = QueryOutput::default();
        assert!(output.is_empty());
        assert!(output.columns.is_empty());
    }
}
