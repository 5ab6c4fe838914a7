//! Error handling module for the console.
//!
//! This module provides the crate-wide error type and its specific kinds:
//! - Parse errors raised by the statement evaluator
//! - Execution errors, including cooperative cancellation
//! - Configuration and catalog lookup errors
//!
//! # Example
//!
//! ```rust
//! use vqlsh::error::{LookupError, Result, VqlshError};
//!
//! fn find(name: &str) -> Result<()> {
//!     Err(LookupError::UnknownSymbol(name.to_string()).into())
//! }
//!
//! assert!(matches!(find("bar"), Err(VqlshError::Lookup(_))));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, ExecutionError, LookupError, ParseError, Result, VqlshError};
