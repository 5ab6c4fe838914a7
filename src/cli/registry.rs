//! Subcommand registry
//!
//! Handlers are registered once at startup; the registry is then consulted by
//! name to run the selected subcommand.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use super::CliInterface;
use crate::error::{ConfigError, Result};

/// A runnable subcommand
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name the subcommand is registered under
    fn name(&self) -> &'static str;

    /// Run the subcommand
    ///
    /// # Arguments
    /// * `cli` - Parsed arguments and merged configuration
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    async fn run(&self, cli: &CliInterface) -> Result<()>;
}

/// Explicit table of subcommand handlers
#[derive(Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any handler with the same name
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    /// Builder-style `register`
    pub fn with(mut self, handler: Box<dyn CommandHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Run the handler registered under `name`
    ///
    /// # Arguments
    /// * `name` - Subcommand name
    /// * `cli` - Parsed arguments and merged configuration
    ///
    /// # Returns
    /// * `Result<()>` - Handler result, or `ConfigError::InvalidValue` for an unknown name
    pub async fn run(&self, name: &str, cli: &CliInterface) -> Result<()> {
        let handler = self.handlers.get(name).ok_or_else(|| ConfigError::InvalidValue {
            field: "command".to_string(),
            value: name.to_string(),
        })?;

        debug!("Running command {}", name);
        handler.run(cli).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VqlshError;
    use clap::Parser;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCommand {
        name: &'static str,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandHandler for CountingCommand {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, _cli: &CliInterface) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn cli() -> CliInterface {
        let args = crate::cli::CliArgs::try_parse_from(["vqlsh"]).unwrap();
        CliInterface::with_config(args, crate::config::Config::default())
    }

    #[tokio::test]
    async fn test_run_registered_command() {
        let runs = Arc::new(AtomicUsize::new(0));
        let registry = CommandRegistry::new().with(Box::new(CountingCommand {
            name: "count",
            runs: runs.clone(),
        }));

        registry.run("count", &cli()).await.unwrap();
        registry.run("count", &cli()).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(registry.contains("count"));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let registry = CommandRegistry::new();
        let err = registry.run("missing", &cli()).await.unwrap_err();
        assert!(matches!(
            err,
            VqlshError::Config(ConfigError::InvalidValue { ref value, .. }) if value == "missing"
        ));
    }

    #[test]
    fn test_names_sorted() {
        let runs = Arc::new(AtomicUsize::new(0));
        let registry = CommandRegistry::new()
            .with(Box::new(CountingCommand { name: "version", runs: runs.clone() }))
            .with(Box::new(CountingCommand { name: "config", runs }));
        assert_eq!(registry.names(), vec!["config", "version"]);
    }
}
