//! Interactive console front-end for VQL
//!
//! This module provides the pieces the console loop is built from:
//! - Line editing with reedline and a Tab completion menu
//! - Context-aware completion of keywords, plugins, functions and variables
//! - The `VQL > ` prompt
//! - Session history persisted between runs

pub mod completer;
pub mod completion;
pub mod engine;
pub mod prompt;
pub mod state;

pub use completer::VqlCompleter;
pub use completion::{CompletionContext, CompletionEngine};
pub use engine::ConsoleEngine;
pub use prompt::{DEFAULT_PROMPT, VqlPrompt};
pub use state::ConsoleState;
