//! Completion context definitions
//!
//! This module splits the text before the cursor into a [`ParsePosition`] and
//! classifies it into a [`CompletionContext`] naming what should be completed.

use super::fsm::SelectClause;

/// Tokenized view of the text typed so far.
///
/// Splitting on single spaces is the only tokenization rule, so consecutive
/// spaces produce empty tokens and a trailing space produces an empty
/// current word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePosition<'a> {
    /// Raw tokens, including empty ones
    pub tokens: Vec<&'a str>,
    /// Last non-empty token
    pub last_word: &'a str,
    /// Non-empty token before `last_word`
    pub previous_word: &'a str,
    /// Partial word under the cursor (empty right after a space)
    pub current_word: &'a str,
}

impl<'a> ParsePosition<'a> {
    /// Tokenize raw input text
    pub fn parse(text: &'a str) -> Self {
        Self::from_tokens(text.split(' ').collect())
    }

    /// Build a position from already split tokens
    pub fn from_tokens(tokens: Vec<&'a str>) -> Self {
        let mut last_word = "";
        let mut previous_word = "";
        for token in tokens.iter().filter(|t| !t.is_empty()) {
            previous_word = last_word;
            last_word = token;
        }

        let current_word = tokens.last().copied().unwrap_or("");

        Self {
            tokens,
            last_word,
            previous_word,
            current_word,
        }
    }

    /// Position covering the tokens from `index` on
    pub fn suffix(&self, index: usize) -> ParsePosition<'a> {
        let start = index.min(self.tokens.len());
        Self::from_tokens(self.tokens[start..].to_vec())
    }

    /// Whether the token at `index` equals `keyword`, ignoring case
    pub fn token_is(&self, index: usize, keyword: &str) -> bool {
        self.tokens
            .get(index)
            .is_some_and(|t| t.eq_ignore_ascii_case(keyword))
    }

    /// Whether any token equals `keyword`, ignoring case
    pub fn contains_keyword(&self, keyword: &str) -> bool {
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(keyword))
    }
}

/// Represents the type of completion needed based on the current input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContext {
    /// Nothing typed yet
    Empty,

    /// First word of a statement
    Statement,

    /// Inside a SELECT statement
    Select(SelectClause),

    /// `LET name ` - assignment operator expected
    LetOperator,

    /// `LET name = ` - query expected
    LetQuery,

    /// After `HELP`
    Help,

    /// No completion available
    None,
}

impl CompletionContext {
    /// Classify raw input text
    pub fn classify(text: &str) -> Self {
        if text.is_empty() {
            return CompletionContext::Empty;
        }
        Self::from_position(&ParsePosition::parse(text))
    }

    /// Classify an already tokenized position
    pub fn from_position(position: &ParsePosition<'_>) -> Self {
        if position.tokens.len() <= 1 {
            return CompletionContext::Statement;
        }

        if position.token_is(0, "SELECT") {
            CompletionContext::Select(SelectClause::detect(position))
        } else if position.token_is(0, "LET") {
            match position.tokens.len() {
                3 => CompletionContext::LetOperator,
                4 => CompletionContext::LetQuery,
                n if n > 4 && position.token_is(3, "SELECT") => {
                    CompletionContext::Select(SelectClause::detect(&position.suffix(3)))
                }
                _ => CompletionContext::None,
            }
        } else if position.token_is(0, "HELP") {
            CompletionContext::Help
        } else {
            CompletionContext::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trailing_space() {
        let pos = ParsePosition::parse("SELECT * FROM ");
        assert_eq!(pos.tokens, vec!["SELECT", "*", "FROM", ""]);
        assert_eq!(pos.last_word, "FROM");
        assert_eq!(pos.previous_word, "*");
        assert_eq!(pos.current_word, "");
    }

    #[test]
    fn test_parse_partial_word() {
        let pos = ParsePosition::parse("SELECT fo");
        assert_eq!(pos.last_word, "fo");
        assert_eq!(pos.previous_word, "SELECT");
        assert_eq!(pos.current_word, "fo");
    }

    #[test]
    fn test_parse_double_space_skips_empty_tokens() {
        let pos = ParsePosition::parse("SELECT  a,  ");
        assert_eq!(pos.tokens.len(), 5);
        assert_eq!(pos.last_word, "a,");
        assert_eq!(pos.previous_word, "SELECT");
    }

    #[test]
    fn test_suffix() {
        let pos = ParsePosition::parse("LET x = SELECT * FROM ");
        let sub = pos.suffix(3);
        assert_eq!(sub.tokens, vec!["SELECT", "*", "FROM", ""]);
        assert_eq!(sub.current_word, pos.current_word);
    }

    #[test]
    fn test_classify_statement() {
        assert_eq!(CompletionContext::classify(""), CompletionContext::Empty);
        assert_eq!(CompletionContext::classify("SEL"), CompletionContext::Statement);
        assert_eq!(CompletionContext::classify("help "), CompletionContext::Help);
        assert_eq!(CompletionContext::classify("DROP table"), CompletionContext::None);
    }

    #[test]
    fn test_classify_let() {
        assert_eq!(CompletionContext::classify("LET x"), CompletionContext::None);
        assert_eq!(CompletionContext::classify("LET x "), CompletionContext::LetOperator);
        assert_eq!(CompletionContext::classify("let x = "), CompletionContext::LetQuery);
        assert_eq!(
            CompletionContext::classify("LET x = select "),
            CompletionContext::Select(SelectClause::AfterSelect)
        );
        assert_eq!(CompletionContext::classify("LET x = foo bar"), CompletionContext::None);
    }
}
