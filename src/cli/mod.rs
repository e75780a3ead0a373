//! Command Line Interface module
//!
//! This module contains the CLI argument parsing, the one-shot command
//! implementations and the interactive shell.

pub mod args;
pub mod commands;
pub mod shell;

pub use args::*;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::utils::logging;

/// Load the configuration and apply command line overrides
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(program) = &cli.flasher {
        config.flasher.program = program.clone();
    }
    Ok(config)
}

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = load_config(&cli)?;

    logging::init_cli_logging(
        cli.verbose,
        cli.quiet,
        cli.is_shell(),
        logging::parse_level(&config.ui.log_level),
    )?;

    match cli.command.clone() {
        Some(command) => commands::execute_command(command, &cli, &config).await,
        None => shell::run_shell(&config).await,
    }
}
