//! Completion engine - orchestrates the completion flow
//!
//! This module ties together tokenization, context classification and
//! candidate fetching, then sorts and prefix-filters the result.

use tracing::trace;

use super::context::{CompletionContext, ParsePosition};
use super::fsm::SelectClause;
use super::filter_has_prefix;
use crate::catalog::{Suggestion, SuggestionSource};

/// Main completion engine
#[derive(Clone)]
pub struct CompletionEngine {
    /// Source of variable, function and plugin names
    source: SuggestionSource,
}

impl CompletionEngine {
    /// Create a new completion engine
    ///
    /// # Arguments
    /// * `source` - Suggestion source for fetching catalog names
    pub fn new(source: SuggestionSource) -> Self {
        Self { source }
    }

    /// Complete the text typed so far
    ///
    /// # Arguments
    /// * `text` - Input text before the cursor
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - Candidates sorted by text, filtered by the current word
    pub fn complete(&self, text: &str) -> Vec<Suggestion> {
        if text.is_empty() {
            return Vec::new();
        }

        let position = ParsePosition::parse(text);
        let context = CompletionContext::from_position(&position);
        trace!("Completion context for {:?}: {:?}", text, context);

        let mut candidates = self.fetch_candidates(context);
        candidates.sort_by(|a, b| a.text.cmp(&b.text));

        filter_has_prefix(candidates, position.current_word)
    }

    /// Unfiltered, unsorted candidates for a context
    pub fn fetch_candidates(&self, context: CompletionContext) -> Vec<Suggestion> {
        match context {
            CompletionContext::Empty | CompletionContext::None => Vec::new(),
            CompletionContext::Statement => statement_keywords(),
            CompletionContext::Select(clause) => self.select_candidates(clause),
            CompletionContext::LetOperator => vec![
                Suggestion::new("=", "Store query in scope"),
                Suggestion::new("<=", "Materialize query in scope"),
            ],
            CompletionContext::LetQuery => vec![Suggestion::new("SELECT", "Start Query")],
            CompletionContext::Help => {
                let mut columns = self.source.functions(false);
                columns.extend(self.source.plugins(false));
                columns
            }
        }
    }

    fn select_candidates(&self, clause: SelectClause) -> Vec<Suggestion> {
        let mut columns = Vec::new();

        match clause {
            SelectClause::AfterSelect => {
                columns.push(from_keyword());
                columns.push(Suggestion::new("*", "All columns"));
                columns.extend(self.source.variables());
                columns.extend(self.source.functions(true));
            }
            SelectClause::ColumnList => {
                columns.push(from_keyword());
                columns.extend(self.source.variables());
                columns.extend(self.source.functions(true));
            }
            SelectClause::BeforeFrom => columns.push(from_keyword()),
            SelectClause::Source => {
                columns.extend(self.source.variables());
                columns.extend(self.source.plugins(true));
            }
            SelectClause::AfterSource => {
                columns.push(Suggestion::new(
                    "WHERE",
                    "Condition to filter the result set",
                ));
                columns.extend(limit_keywords());
            }
            SelectClause::Condition => {
                columns.extend(limit_keywords());
                columns.extend(self.source.variables());
                columns.extend(self.source.functions(true));
            }
        }

        columns
    }
}

fn statement_keywords() -> Vec<Suggestion> {
    vec![
        Suggestion::new("SELECT", "Start a query"),
        Suggestion::new("LET", "Assign a stored query"),
        Suggestion::new("HELP", "Show help about plugins, functions etc"),
    ]
}

fn from_keyword() -> Suggestion {
    Suggestion::new("FROM", "Select from plugin")
}

fn limit_keywords() -> Vec<Suggestion> {
    vec![
        Suggestion::new("LIMIT", "Limit to this many rows"),
        Suggestion::new("ORDER BY", "order results by a column"),
    ]
}
