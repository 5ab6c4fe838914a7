//! Shell completion generation for vqlsh

use std::io::Write;

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

/// Binary name used in generated scripts
const BIN_NAME: &str = "vqlsh";

/// Write a shell completion script
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish, elvish, powershell)
/// * `out` - Destination of the script
///
/// # Returns
/// * `Result<()>` - Success or error for an unknown shell
pub fn generate_completion(shell_name: &str, out: &mut dyn Write) -> Result<()> {
    let shell = parse_shell(shell_name)?;
    let mut cmd = CliArgs::command();
    generate(shell, &mut cmd, BIN_NAME, out);
    Ok(())
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    shell_name
        .to_lowercase()
        .parse::<Shell>()
        .map_err(|_| {
            ConfigError::InvalidValue {
                field: "shell".to_string(),
                value: shell_name.to_string(),
            }
            .into()
        })
}
