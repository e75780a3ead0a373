//! Flash command implementation

use crate::app::create_app_state;
use crate::catalog::RemovalOutcome;
use crate::cli::commands::{finish, format_bank, report_notices};
use crate::config::AppConfig;
use crate::models::BankId;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub async fn execute_flash_command(
    config: &AppConfig,
    bank: BankId,
    add: &[PathBuf],
    remove: &[String],
) -> Result<()> {
    println!("⚡ EMS Deck flash - bank {}", bank);

    let (mut state, mut rx) = create_app_state(config);

    // Titles to remove are only known after reading the cartridge
    state.scan_all()?;
    state.run_until_idle(&mut rx).await?;
    let failures = report_notices(&mut state, false);
    if failures > 0 {
        return Err(anyhow::anyhow!("Cannot read the cartridge, nothing was changed"));
    }

    for title in remove {
        match state
            .remove(bank, title)
            .with_context(|| format!("Cannot remove '{}'", title))?
        {
            RemovalOutcome::Marked => println!("🗑️  {} will be removed", title),
            RemovalOutcome::Deleted => println!("🗑️  {} dropped from the queue", title),
        }
    }

    for path in add {
        let title = state
            .add_file(bank, path)
            .with_context(|| format!("Cannot add {}", path.display()))?;
        println!("➕ {} ({})", title, path.display());
    }

    let changes = state.flash(bank)?;
    if changes.is_empty() {
        report_notices(&mut state, true);
        return Ok(());
    }

    println!(
        "🔥 Flashing: {} removal(s), {} write(s)...",
        changes.removals.len(),
        changes.writes.len()
    );
    state.run_until_idle(&mut rx).await?;

    let failures = report_notices(&mut state, true);
    print!("{}", format_bank(state.catalog(), bank));
    finish(failures)
}
