//! Format command implementation

use crate::app::create_app_state;
use crate::cli::commands::{finish, format_bank, report_notices};
use crate::config::AppConfig;
use crate::models::BankId;
use anyhow::Result;
use std::io::{BufRead, Write};

/// Ask on stdin; only an explicit "y"/"yes" confirms
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub async fn execute_format_command(config: &AppConfig, bank: BankId, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("⚠️  Erase every ROM on bank {}?", bank))? {
        println!("Aborted.");
        return Ok(());
    }

    let (mut state, mut rx) = create_app_state(config);
    state.format(bank)?;
    state.run_until_idle(&mut rx).await?;

    let failures = report_notices(&mut state, true);
    print!("{}", format_bank(state.catalog(), bank));
    finish(failures)
}
