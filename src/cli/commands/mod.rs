//! CLI command implementations

pub mod config;
pub mod flash;
pub mod format;
pub mod inspect;
pub mod scan;

use crate::app::{AppState, Notice};
use crate::catalog::CatalogStore;
use crate::cli::args::{Cli, Commands};
use crate::config::AppConfig;
use crate::models::{BankId, RomEntry};
use anyhow::Result;

/// Execute a CLI command
pub async fn execute_command(command: Commands, cli: &Cli, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Scan { bank, json } => scan::execute_scan_command(config, bank, json).await,
        Commands::Flash { bank, add, remove } => {
            flash::execute_flash_command(config, bank, &add, &remove).await
        }
        Commands::Format { bank, yes } => format::execute_format_command(config, bank, yes).await,
        Commands::Inspect { files } => inspect::execute_inspect_command(&files),
        Commands::Config { force } => config::execute_config_command(cli, force),
        Commands::Shell => crate::cli::shell::run_shell(config).await,
    }
}

/// Render one bank table the way the shell and the commands show it
pub fn format_bank(catalog: &CatalogStore, bank: BankId) -> String {
    let mut out = format!(
        "📦 Bank {} - {} KB used, {} KB free\n",
        bank,
        catalog.occupied_kb(bank),
        catalog.remaining_kb(bank)
    );

    let entries = catalog.entries(bank);
    if entries.is_empty() {
        out.push_str("   (empty)\n");
        return out;
    }

    for entry in entries {
        out.push_str(&format_entry(entry));
    }
    out
}

/// One table row, newline-terminated
pub fn format_entry(entry: &RomEntry) -> String {
    format!(
        " {} {:<4} {:<16} {:>6} KB  {:<15} {}\n",
        entry.status.symbol(),
        entry.bank_id_on_cartridge,
        entry.title,
        entry.size_kb,
        entry.status.label(),
        entry.enhancements
    )
}

/// Print the pending notices; returns how many were failures.
/// Failures always go to stderr, informational notices only when `show_info`.
pub fn report_notices(state: &mut AppState, show_info: bool) -> usize {
    let mut failures = 0;
    for notice in state.take_notices() {
        match notice {
            Notice::OperationFailed { .. } => {
                failures += 1;
                eprintln!("{}", notice);
            }
            Notice::Idle => {}
            Notice::Info(_) if show_info => println!("{}", notice),
            Notice::Info(_) => {}
        }
    }
    failures
}

/// Turn reported failures into a non-zero exit
pub fn finish(failures: usize) -> Result<()> {
    if failures > 0 {
        return Err(anyhow::anyhow!("{} operation(s) failed", failures));
    }
    Ok(())
}
