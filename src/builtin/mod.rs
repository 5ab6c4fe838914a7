//! Builtin VQL evaluator
//!
//! A small in-process evaluator for a subset of VQL: `SELECT` with an
//! optional `FROM`, `WHERE`, `ORDER BY` and `LIMIT`, plus `LET` in both its
//! stored (`=`) and materialized (`<=`) forms. Sources are the builtin
//! plugins, `LET` variables and `Artifact.<name>()` definitions from the
//! configuration.

pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod plugins;
pub mod scope;
pub mod statement;

pub use evaluator::{BuiltinEvaluator, EvalContext};
pub use scope::{Binding, BuiltinScope};
pub use statement::{LetMode, SelectQuery, Statement};
