//! Statement router for dispatching accepted lines
//!
//! This module provides the StatementRouter which dispatches a line by its
//! leading keyword, matched case-insensitively:
//! - `SELECT` / `LET` → the evaluator, wrapped by the cancellation controller
//! - `HELP` → the help resolver
//! - anything else → ignored
//!
//! Routed statements are appended to the session history before they run, so
//! statements that fail stay recallable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use super::cancel::CancellationController;
use super::help::{HelpResolver, HelpTopic};
use super::{Evaluator, QueryOutput};
use crate::error::Result;
use crate::repl::ConsoleState;

/// Where a leading keyword sends a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Hand to the evaluator
    Execute,
    /// Resolve as a help query
    Help,
}

/// Leading keywords the router understands
#[derive(Debug, Clone)]
pub struct KeywordTable {
    routes: HashMap<&'static str, Route>,
}

impl KeywordTable {
    pub fn new() -> Self {
        let routes = HashMap::from([
            ("SELECT", Route::Execute),
            ("LET", Route::Execute),
            ("HELP", Route::Help),
        ]);
        Self { routes }
    }

    /// Route for a keyword, ignoring case
    pub fn lookup(&self, keyword: &str) -> Option<Route> {
        self.routes.get(keyword.to_uppercase().as_str()).copied()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of dispatching one line
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Empty line or unrecognized leading keyword
    Ignored,

    /// Statement was handed to the evaluator
    Executed(Result<QueryOutput>),

    /// Help lookup result
    Help(Result<HelpTopic>),
}

/// Router that dispatches statements to the evaluator or the help resolver
pub struct StatementRouter {
    keywords: KeywordTable,
    evaluator: Arc<dyn Evaluator>,
    help: HelpResolver,
    cancellation: CancellationController,
}

impl StatementRouter {
    /// Create a new statement router
    ///
    /// # Arguments
    /// * `evaluator` - Evaluator for `SELECT` and `LET` statements
    /// * `help` - Resolver for `HELP` statements
    /// * `cancellation` - Controller arming an interrupt listener per statement
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        help: HelpResolver,
        cancellation: CancellationController,
    ) -> Self {
        Self {
            keywords: KeywordTable::new(),
            evaluator,
            help,
            cancellation,
        }
    }

    /// Dispatch one accepted line
    ///
    /// # Arguments
    /// * `state` - Session state receiving the history entry
    /// * `text` - Line as typed
    ///
    /// # Returns
    /// * `DispatchOutcome` - What happened to the line
    pub async fn dispatch(&self, state: &mut ConsoleState, text: &str) -> DispatchOutcome {
        if text.is_empty() {
            return DispatchOutcome::Ignored;
        }

        let keyword = text.split(' ').next().unwrap_or_default();
        let Some(route) = self.keywords.lookup(keyword) else {
            debug!("Ignoring statement with leading token {:?}", keyword);
            return DispatchOutcome::Ignored;
        };

        state.push(text);

        match route {
            Route::Help => DispatchOutcome::Help(self.help.resolve(text)),
            Route::Execute => DispatchOutcome::Executed(self.execute(text).await),
        }
    }

    async fn execute(&self, text: &str) -> Result<QueryOutput> {
        let span = info_span!("statement", id = %Uuid::new_v4());
        let evaluator = Arc::clone(&self.evaluator);

        async move {
            debug!("Executing: {}", text);
            let start = Instant::now();

            let result = self
                .cancellation
                .run(|token| async move { evaluator.evaluate(text, token).await })
                .await;

            debug!("Statement finished in {}ms", start.elapsed().as_millis());
            result
        }
        .instrument(span)
        .await
    }
}
