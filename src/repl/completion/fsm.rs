//! State machine for SELECT completion
//!
//! Completion runs on every keystroke, usually over input that is not a valid
//! statement yet, so instead of parsing the statement the clause is decided
//! from three facts:
//! - whether a `FROM` token exists
//! - whether a `WHERE` token exists
//! - what sits right before the cursor

use super::context::ParsePosition;

/// Clause of a SELECT statement the cursor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectClause {
    /// Right after `SELECT`: wildcard, columns or `FROM`
    AfterSelect,

    /// After a comma, or while typing a column
    ColumnList,

    /// Between columns with nothing typed: only `FROM` fits
    BeforeFrom,

    /// After `FROM`: a variable or plugin
    Source,

    /// After the source, no `WHERE` yet
    AfterSource,

    /// Inside the `WHERE` condition
    Condition,
}

impl SelectClause {
    /// Determine the clause for tokens starting at the `SELECT` keyword
    pub fn detect(position: &ParsePosition<'_>) -> Self {
        let last = position.last_word;
        let typing = !position.current_word.is_empty();

        if !position.contains_keyword("FROM") {
            if last.eq_ignore_ascii_case("SELECT") {
                SelectClause::AfterSelect
            } else if last.ends_with(',') || typing {
                SelectClause::ColumnList
            } else {
                SelectClause::BeforeFrom
            }
        } else if last.eq_ignore_ascii_case("FROM")
            || (typing && position.previous_word.eq_ignore_ascii_case("FROM"))
        {
            SelectClause::Source
        } else if !position.contains_keyword("WHERE") {
            SelectClause::AfterSource
        } else {
            SelectClause::Condition
        }
    }
}
