//! Console session state and its persistence
//!
//! The history file is a JSON object with a single `History` field holding
//! the accepted statements in chronological order. It is read once at startup
//! and written once at shutdown. Neither direction ever fails the caller: a
//! missing or corrupt file gives an empty state, and a failed write is logged
//! and dropped.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Ordered history of accepted statements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleState {
    #[serde(rename = "History", default, deserialize_with = "null_as_empty")]
    history: Vec<String>,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted statement. Empty text is never recorded.
    pub fn push(&mut self, statement: impl Into<String>) {
        let statement = statement.into();
        if !statement.is_empty() {
            self.history.push(statement);
        }
    }

    /// Statements in the order they were accepted
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Load state from a history file
    ///
    /// # Arguments
    /// * `path` - History file path
    ///
    /// # Returns
    /// * `Self` - Loaded state, or an empty one if the file is missing or unreadable
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No history loaded from {}: {}", path.display(), e);
                return Self::new();
            }
        };

        match serde_json::from_str::<ConsoleState>(&content) {
            Ok(mut state) => {
                state.history.retain(|s| !s.is_empty());
                debug!(
                    "Loaded {} history entries from {}",
                    state.history.len(),
                    path.display()
                );
                state
            }
            Err(e) => {
                warn!("Ignoring malformed history file {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Save state to a history file, logging and discarding any failure
    ///
    /// # Arguments
    /// * `path` - History file path
    pub fn save(&self, path: &Path) {
        match self.try_save(path) {
            Ok(()) => debug!(
                "Saved {} history entries to {}",
                self.history.len(),
                path.display()
            ),
            Err(e) => warn!("Failed to save history to {}: {}", path.display(), e),
        }
    }

    fn try_save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_vec(self)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        file.write_all(&serialized)?;
        Ok(())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
