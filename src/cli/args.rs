//! Command line argument parsing

use crate::models::BankId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "emsdeck")]
#[command(about = "🎮 Front-end for ems-flasher - manage ROMs on EMS Game Boy flash cartridges")]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/emsdeck/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ems-flasher executable, overrides the configuration
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub flasher: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Read the titles stored on the cartridge
    Scan {
        /// Only scan this bank (1 or 2); both banks by default
        #[arg(short, long)]
        bank: Option<BankId>,
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add and/or remove ROMs on one bank and write the result to the cartridge
    Flash {
        /// Bank to modify (1 or 2)
        #[arg(short, long)]
        bank: BankId,
        /// ROM files (.gb/.gbc) to write
        #[arg(short, long, num_args = 1.., value_name = "FILE")]
        add: Vec<PathBuf>,
        /// Titles to delete from the cartridge
        #[arg(short, long, value_name = "TITLE")]
        remove: Vec<String>,
    },
    /// Erase every ROM on one bank
    Format {
        /// Bank to erase (1 or 2)
        #[arg(short, long)]
        bank: BankId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the title and size of local ROM files without touching the cartridge
    Inspect {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Write the default configuration file
    Config {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Interactive shell (default)
    Shell,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn is_shell(&self) -> bool {
        matches!(self.command, None | Some(Commands::Shell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_arguments() {
        let cli = Cli::try_parse_from([
            "emsdeck", "flash", "--bank", "2", "--add", "a.gb", "b.gbc", "--remove", "TETRIS",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Flash {
                bank: BankId::Two,
                add: vec![PathBuf::from("a.gb"), PathBuf::from("b.gbc")],
                remove: vec!["TETRIS".to_string()],
            })
        );
        assert!(!cli.is_shell());
    }

    #[test]
    fn test_invalid_bank_is_rejected() {
        assert!(Cli::try_parse_from(["emsdeck", "format", "--bank", "3"]).is_err());
    }

    #[test]
    fn test_defaults_to_shell() {
        let cli = Cli::try_parse_from(["emsdeck", "-v"]).unwrap();
        assert!(cli.is_shell());
        assert_eq!(cli.verbose, 1);
    }
}
