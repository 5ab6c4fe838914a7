//! Built-in subcommands other than the console itself

use std::io::{self, Write};

use async_trait::async_trait;

use super::completion::generate_completion;
use super::registry::CommandHandler;
use super::{CliInterface, Commands};
use crate::config::Config;
use crate::error::{ConfigError, Result};

/// `vqlsh version`
pub struct VersionCommand;

#[async_trait]
impl CommandHandler for VersionCommand {
    fn name(&self) -> &'static str {
        "version"
    }

    async fn run(&self, _cli: &CliInterface) -> Result<()> {
        println!("vqlsh version {}", crate::VERSION);
        Ok(())
    }
}

/// `vqlsh completion <SHELL>`
pub struct CompletionCommand;

#[async_trait]
impl CommandHandler for CompletionCommand {
    fn name(&self) -> &'static str {
        "completion"
    }

    async fn run(&self, cli: &CliInterface) -> Result<()> {
        let Some(Commands::Completion { shell }) = &cli.args().command else {
            return Err(ConfigError::MissingField("shell".to_string()).into());
        };

        let mut stdout = io::stdout().lock();
        generate_completion(shell, &mut stdout)?;
        stdout.flush()?;
        Ok(())
    }
}

/// `vqlsh config [--show] [--validate]`
pub struct ConfigCommand;

impl ConfigCommand {
    /// Validate configuration file
    fn validate_config_file(cli: &CliInterface) -> String {
        let path = cli.config_path();
        if !path.exists() {
            return format!("{}: file does not exist, defaults apply", path.display());
        }

        match Config::load_from_file(Some(&path)).and_then(|config| config.validate()) {
            Ok(()) => format!("{}: configuration is valid", path.display()),
            Err(e) => format!("{}: {}", path.display(), e),
        }
    }

    /// Show effective configuration
    fn show_config(cli: &CliInterface) -> Result<String> {
        Ok(format!(
            "# Configuration file: {}\n\n{}",
            cli.config_path().display(),
            cli.config().to_toml()?
        ))
    }
}

#[async_trait]
impl CommandHandler for ConfigCommand {
    fn name(&self) -> &'static str {
        "config"
    }

    async fn run(&self, cli: &CliInterface) -> Result<()> {
        let (show, validate) = match &cli.args().command {
            Some(Commands::Config { show, validate }) => (*show, *validate),
            _ => (true, false),
        };

        if validate {
            println!("{}", Self::validate_config_file(cli));
        }
        if show || !validate {
            println!("{}", Self::show_config(cli)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliArgs;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> CliInterface {
        CliInterface::with_config(CliArgs::try_parse_from(args).unwrap(), Config::default())
    }

    #[test]
    fn test_show_config_is_toml() {
        let cli = cli(&["vqlsh", "--env", "Hostname=web1", "config", "--show"]);
        let text = ConfigCommand::show_config(&cli).unwrap();

        let body = text.split_once("\n\n").unwrap().1;
        let parsed = Config::from_toml(body).unwrap();
        assert_eq!(parsed.env.get("Hostname").map(String::as_str), Some("web1"));
    }

    #[test]
    fn test_validate_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        let cli = cli(&["vqlsh", "--config", path.to_str().unwrap(), "config", "--validate"]);
        assert!(ConfigCommand::validate_config_file(&cli).contains("does not exist"));
    }

    #[test]
    fn test_validate_reports_bad_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[console]\nmax_suggestions = 0\n").unwrap();
        let cli = cli(&["vqlsh", "--config", path.to_str().unwrap(), "config", "--validate"]);
        assert!(ConfigCommand::validate_config_file(&cli).contains("max_suggestions"));
    }

    #[tokio::test]
    async fn test_completion_needs_completion_args() {
        let cli = cli(&["vqlsh", "version"]);
        assert!(CompletionCommand.run(&cli).await.is_err());
    }
}
