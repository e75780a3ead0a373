//! Config command implementation

use crate::cli::args::Cli;
use crate::config::AppConfig;
use anyhow::{Context, Result};

pub fn execute_config_command(cli: &Cli, force: bool) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()
            .ok_or_else(|| anyhow::anyhow!("No configuration directory on this system"))?,
    };

    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists, use --force to overwrite it",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = AppConfig::default().to_toml()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;

    println!("📝 Configuration written to {}", path.display());
    Ok(())
}
