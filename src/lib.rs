//! VQL Shell Library
//!
//! This library provides the interactive console front-end for VQL: context
//! aware completion, inline help, statement dispatch with interrupt handling,
//! and persistent session history. Evaluation is delegated to an [`Evaluator`];
//! a small builtin one is included.
//!
//! # Modules
//!
//! - `builtin`: Builtin scope and evaluator for a subset of VQL
//! - `catalog`: Variables, functions, plugins and artifacts offered to the console
//! - `cli`: Command-line interface and subcommands
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `executor`: Statement routing, help and cancellation
//! - `formatter`: Output formatting and display
//! - `repl`: Line editor, completion and session state
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vqlsh::builtin::{BuiltinEvaluator, BuiltinScope};
//! use vqlsh::catalog::SuggestionSource;
//! use vqlsh::executor::{CancellationController, DispatchOutcome, HelpResolver, StatementRouter};
//! use vqlsh::repl::ConsoleState;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scope = Arc::new(BuiltinScope::empty());
//!     let source = SuggestionSource::new(scope.clone(), None);
//!     let router = StatementRouter::new(
//!         Arc::new(BuiltinEvaluator::new(scope)),
//!         HelpResolver::new(source),
//!         CancellationController::ctrl_c(),
//!     );
//!
//!     let mut state = ConsoleState::new();
//!     if let DispatchOutcome::Executed(Ok(output)) =
//!         router.dispatch(&mut state, "SELECT * FROM range(end=3)").await
//!     {
//!         println!("{} rows", output.len());
//!     }
//! }
//! ```

pub mod builtin;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod repl;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, VqlshError};
pub use executor::{Evaluator, QueryOutput, StatementRouter};
pub use formatter::Formatter;
pub use repl::{ConsoleEngine, ConsoleState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
