//! Completion system for the console
//!
//! Completion runs on every keystroke and must tolerate partial, syntactically
//! invalid input, so it never parses the statement. Instead:
//!
//! - **Context**: the text before the cursor is split on spaces into a
//!   `ParsePosition` and classified into a `CompletionContext`
//! - **FSM**: inside `SELECT`, a small state machine picks the clause from the
//!   presence of `FROM`/`WHERE` and what precedes the cursor
//! - **Engine**: fetches the candidates for the context from the
//!   `SuggestionSource`, sorts them by text and filters them by the current word
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use vqlsh::catalog::{MemoryScope, SuggestionSource};
//! use vqlsh::repl::completion::CompletionEngine;
//!
//! let source = SuggestionSource::new(Arc::new(MemoryScope::new()), None);
//! let engine = CompletionEngine::new(source);
//!
//! let suggestions = engine.complete("S");
//! assert_eq!(suggestions[0].text, "SELECT");
//! ```

mod context;
mod engine;
mod fsm;

pub use crate::catalog::Suggestion;
pub use context::{CompletionContext, ParsePosition};
pub use engine::CompletionEngine;
pub use fsm::SelectClause;

/// Keep suggestions whose text starts with `word`, ignoring case.
///
/// An empty word keeps everything. Order is preserved.
pub fn filter_has_prefix(suggestions: Vec<Suggestion>, word: &str) -> Vec<Suggestion> {
    if word.is_empty() {
        return suggestions;
    }

    let word = word.to_lowercase();
    suggestions
        .into_iter()
        .filter(|s| s.text.to_lowercase().starts_with(&word))
        .collect()
}
