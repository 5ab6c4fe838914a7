//! Command-line interface for vqlsh
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and merging with arguments
//! - The subcommand registry and the built-in subcommands

pub mod commands;
pub mod completion;
pub mod registry;

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConsoleSettings, LogLevel, OutputFormat};
use crate::error::Result;

pub use commands::{CompletionCommand, ConfigCommand, VersionCommand};
pub use registry::{CommandHandler, CommandRegistry};

/// Interactive console for the Velociraptor Query Language
#[derive(Parser, Debug)]
#[command(
    name = "vqlsh",
    version,
    about = "Interactive VQL console",
    long_about = "An interactive console for VQL statements with context-aware completion,
inline help and persistent history."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Extra scope variable, may be repeated
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for vqlsh
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive console (default)
    Console {
        /// Output format for query results
        #[arg(long, value_enum, value_name = "FORMAT")]
        format: Option<OutputFormat>,

        /// Directory uploaded files are written to
        #[arg(long, value_name = "DIR")]
        dump_dir: Option<PathBuf>,

        /// History file path
        #[arg(long = "history", value_name = "FILE")]
        history_file: Option<PathBuf>,

        /// Disable colored output
        #[arg(long = "no-color")]
        no_color: bool,
    },

    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Commands {
    /// Name the subcommand's handler is registered under
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Console { .. } => "console",
            Commands::Version => "version",
            Commands::Completion { .. } => "completion",
            Commands::Config { .. } => "config",
        }
    }
}

/// Parse a `KEY=VALUE` pair
fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Configuration after command-line overrides
    config: Config,

    /// Console settings frozen from `config`
    settings: ConsoleSettings,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(std::env::args_os())
    }

    /// Create a CLI interface from an explicit argument list
    ///
    /// # Arguments
    /// * `args` - Arguments, starting with the binary name
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = CliArgs::try_parse_from(args).unwrap_or_else(|e| e.exit());
        let config = Self::load_config(&args)?;
        Ok(Self::with_config(args, config))
    }

    /// Combine parsed arguments with an already loaded configuration
    ///
    /// # Arguments
    /// * `args` - Parsed arguments
    /// * `config` - Configuration to apply the arguments to
    ///
    /// # Returns
    /// * `Self` - CLI interface with merged configuration
    pub fn with_config(args: CliArgs, mut config: Config) -> Self {
        Self::apply_args_to_config(&mut config, &args);
        let settings = config.console_settings();
        Self {
            args,
            config,
            settings,
        }
    }

    /// Load configuration from file
    ///
    /// An invalid configuration is reported and replaced by the defaults.
    fn load_config(args: &CliArgs) -> Result<Config> {
        let config = Config::load_from_file(args.config_file.as_deref())?;

        // Logging is not initialized yet, so warnings go straight to stderr
        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            return Ok(Config::default());
        }

        Ok(config)
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    /// * `args` - Parsed arguments
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_console_args(config, args);
        Self::apply_logging_args(config, args);

        for (key, value) in &args.env {
            config.env.insert(key.clone(), value.clone());
        }
    }

    /// Apply console-related CLI arguments to configuration
    fn apply_console_args(config: &mut Config, args: &CliArgs) {
        let Some(Commands::Console {
            format,
            dump_dir,
            history_file,
            no_color,
        }) = &args.command
        else {
            return;
        };

        if let Some(format) = format {
            config.console.format = *format;
        }
        if let Some(dump_dir) = dump_dir {
            config.console.dump_dir = dump_dir.clone();
        }
        if let Some(history_file) = history_file {
            config.console.history_file = history_file.clone();
        }
        if *no_color {
            config.console.color_output = false;
        }
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Name of the selected subcommand; the console when none was given
    pub fn command_name(&self) -> &'static str {
        self.args.command.as_ref().map_or("console", Commands::name)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Console settings after all overrides
    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Configuration file path (from args or default)
    pub fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }

    /// Explicit configuration file, if one was given
    pub fn explicit_config_path(&self) -> Option<&Path> {
        self.args.config_file.as_deref()
    }

    /// Print banner with version information
    pub fn print_banner(&self) {
        if !self.args.quiet {
            println!("vqlsh {}", crate::VERSION);
            println!("Type HELP <name> for help on a plugin, function or artifact. Ctrl-D exits.");
        }
    }
}
