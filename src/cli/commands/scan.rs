//! Scan command implementation

use crate::app::create_app_state;
use crate::cli::commands::{finish, format_bank, report_notices};
use crate::config::AppConfig;
use crate::models::BankId;
use anyhow::Result;

pub async fn execute_scan_command(
    config: &AppConfig,
    bank: Option<BankId>,
    json: bool,
) -> Result<()> {
    let (mut state, mut rx) = create_app_state(config);

    match bank {
        Some(bank) => state.scan(bank)?,
        None => state.scan_all()?,
    }
    state.run_until_idle(&mut rx).await?;

    let banks: Vec<BankId> = match bank {
        Some(bank) => vec![bank],
        None => BankId::ALL.to_vec(),
    };
    let failures = report_notices(&mut state, !json);

    if json {
        let listing: serde_json::Map<String, serde_json::Value> = banks
            .iter()
            .map(|bank| {
                let catalog = state.catalog();
                (
                    bank.to_string(),
                    serde_json::json!({
                        "occupied_kb": catalog.occupied_kb(*bank),
                        "remaining_kb": catalog.remaining_kb(*bank),
                        "entries": catalog.entries(*bank),
                    }),
                )
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for bank in banks {
            print!("{}", format_bank(state.catalog(), bank));
        }
    }

    finish(failures)
}
