//! Logging utilities and initialization for EMS Deck

use anyhow::Result;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;

/// Pick the effective level from the command line flags and the configured default
pub fn select_level(verbose: u8, quiet: bool, configured: LevelFilter) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => configured,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Parse a level name from the configuration, falling back to Info
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Initialize logging for the EMS Deck CLI
pub fn init_cli_logging(
    verbose: u8,
    quiet: bool,
    shell_mode: bool,
    configured: LevelFilter,
) -> Result<()> {
    let level = select_level(verbose, quiet, configured);

    if shell_mode {
        // The interactive shell owns the terminal
        init_file_logger(level)?;
    } else {
        Builder::from_default_env()
            .target(Target::Stderr)
            .filter_level(level)
            .format_timestamp_secs()
            .format_module_path(false)
            .init();
    }

    #[cfg(debug_assertions)]
    log_panics::init();

    log::debug!("EMS Deck logging initialized with level: {:?}", level);
    Ok(())
}

/// Directory holding the shell log file
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::APP_NAME)
        .join("logs")
}

/// Initialize file-based logging for shell mode
fn init_file_logger(level: LevelFilter) -> Result<()> {
    use std::fs::OpenOptions;

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_file = log_dir.join("emsdeck.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    Builder::from_default_env()
        .target(Target::Pipe(Box::new(file)))
        .filter_level(level)
        .format_timestamp_secs()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        })
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_selection() {
        assert_eq!(select_level(0, true, LevelFilter::Info), LevelFilter::Error);
        assert_eq!(select_level(3, true, LevelFilter::Info), LevelFilter::Error);
        assert_eq!(select_level(0, false, LevelFilter::Warn), LevelFilter::Warn);
        assert_eq!(select_level(1, false, LevelFilter::Warn), LevelFilter::Debug);
        assert_eq!(select_level(2, false, LevelFilter::Warn), LevelFilter::Trace);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }
}
