//! Completer for reedline - provides completion suggestions

use reedline::{Completer, Span, Suggestion};

use super::completion::{CompletionEngine, ParsePosition};

/// VQL completer for reedline
pub struct VqlCompleter {
    /// Completion engine for context-aware suggestions
    completion_engine: CompletionEngine,

    /// Maximum number of suggestions returned
    max_suggestions: usize,
}

impl VqlCompleter {
    /// Create a new VQL completer
    ///
    /// # Arguments
    /// * `completion_engine` - Engine classifying the typed text
    /// * `max_suggestions` - Upper bound on returned suggestions
    ///
    /// # Returns
    /// * `Self` - New completer
    pub fn new(completion_engine: CompletionEngine, max_suggestions: usize) -> Self {
        Self {
            completion_engine,
            max_suggestions,
        }
    }
}

impl Completer for VqlCompleter {
    /// Complete the input at the given cursor position
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `pos` - Cursor position (byte index)
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - List of completion suggestions
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let Some(before_cursor) = line.get(..pos) else {
            return Vec::new();
        };

        // Replace only the partial word under the cursor
        let current_word = ParsePosition::parse(before_cursor).current_word;
        let start = pos - current_word.len();

        self.completion_engine
            .complete(before_cursor)
            .into_iter()
            .take(self.max_suggestions)
            .map(|candidate| Suggestion {
                value: candidate.text,
                description: (!candidate.description.is_empty()).then_some(candidate.description),
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: false,
                ..Default::default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, MemoryScope, SuggestionSource};
    use std::sync::Arc;

    fn create_test_completer(max_suggestions: usize) -> VqlCompleter {
        let scope = MemoryScope::new()
            .with_variable("config")
            .with_function(CatalogEntry::new("format", "Format a string"))
            .with_plugin(CatalogEntry::new("glob", "Search for files"))
            .with_plugin(CatalogEntry::new("info", ""));
        let engine = CompletionEngine::new(SuggestionSource::new(Arc::new(scope), None));
        VqlCompleter::new(engine, max_suggestions)
    }

    #[test]
    fn test_complete_keyword() {
        let mut completer = create_test_completer(10);
        let suggestions = completer.complete("SE", 2);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "SELECT");
        assert_eq!(suggestions[0].description.as_deref(), Some("Start a query"));
        assert_eq!(suggestions[0].span, Span::new(0, 2));
    }

    #[test]
    fn test_span_covers_partial_word() {
        let mut completer = create_test_completer(10);
        let suggestions = completer.complete("SELECT * FROM gl", 16);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "glob(");
        assert_eq!(suggestions[0].span, Span::new(14, 16));
    }

    #[test]
    fn test_cursor_in_middle_uses_text_before_cursor() {
        let mut completer = create_test_completer(10);
        let suggestions = completer.complete("SELECT * FROM i trailing", 15);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "info(");
        assert_eq!(suggestions[0].description, None);
    }

    #[test]
    fn test_max_suggestions() {
        let mut completer = create_test_completer(2);
        let suggestions = completer.complete("SELECT ", 7);
        assert_eq!(suggestions.len(), 2);
    }
}
