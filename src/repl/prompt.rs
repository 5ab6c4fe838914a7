//! Console prompt

use std::borrow::Cow;

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Default prompt text
pub const DEFAULT_PROMPT: &str = "VQL > ";

/// Prompt for the VQL console
pub struct VqlPrompt {
    /// Left prompt text
    text: String,
}

impl VqlPrompt {
    /// Create a prompt with custom text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for VqlPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

impl Prompt for VqlPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        "".into()
    }

    /// The indicator is part of the left prompt already
    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        "".into()
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        "... ".into()
    }

    /// Render the history search prompt
    ///
    /// # Arguments
    /// * `history_search` - History search state
    ///
    /// # Returns
    /// * `Cow<str>` - History search prompt
    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        format!("({}reverse-search: {}) ", prefix, history_search.term).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt() {
        let prompt = VqlPrompt::default();
        assert_eq!(prompt.render_prompt_left(), "VQL > ");
        assert_eq!(prompt.render_prompt_right(), "");
    }

    #[test]
    fn test_indicator_empty() {
        let prompt = VqlPrompt::default();
        assert_eq!(prompt.render_prompt_indicator(PromptEditMode::Default), "");
    }

    #[test]
    fn test_custom_prompt() {
        let prompt = VqlPrompt::new("vql> ");
        assert_eq!(prompt.render_prompt_left(), "vql> ");
        assert_eq!(prompt.render_prompt_multiline_indicator(), "... ");
    }
}
