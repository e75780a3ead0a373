//! Interactive shell
//!
//! The shell task is the coordination context: it reads user lines and worker
//! events in one `select!` loop, so every state change happens here.

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{AppState, Notice, create_app_state};
use crate::catalog::RemovalOutcome;
use crate::cli::commands::{format_bank, format_entry};
use crate::config::AppConfig;
use crate::models::BankId;

const HELP: &str = "\
Commands:
  list [BANK]             show one or both banks
  find BANK TEXT          show the ROMs of a bank whose title contains TEXT
  add BANK FILE...        queue .gb/.gbc files for writing
  remove BANK TITLE       mark a ROM for removal (or drop it from the queue)
  flash BANK              apply pending changes to the cartridge
  format BANK             erase a bank
  scan [BANK]             re-read the cartridge
  help                    show this text
  quit                    leave";

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List(Option<BankId>),
    Find(BankId, String),
    Add(BankId, Vec<PathBuf>),
    Remove(BankId, String),
    Flash(BankId),
    Format(BankId),
    Scan(Option<BankId>),
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let bank = |word: Option<&str>| -> Result<BankId, String> {
            word.ok_or_else(|| "missing bank (1 or 2)".to_string())?
                .parse()
        };
        let optional_bank = |word: Option<&str>| -> Result<Option<BankId>, String> {
            word.map(str::parse::<BankId>).transpose()
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => ShellCommand::List(optional_bank(words.next())?),
            "find" | "search" => {
                let bank = bank(words.next())?;
                let query = words.collect::<Vec<_>>().join(" ");
                if query.is_empty() {
                    return Err("find needs some text to look for".to_string());
                }
                ShellCommand::Find(bank, query)
            }
            "add" => {
                let bank = bank(words.next())?;
                let files: Vec<PathBuf> = words.map(PathBuf::from).collect();
                if files.is_empty() {
                    return Err("add needs at least one file".to_string());
                }
                ShellCommand::Add(bank, files)
            }
            "remove" | "rm" => {
                let bank = bank(words.next())?;
                let title = words.collect::<Vec<_>>().join(" ");
                if title.is_empty() {
                    return Err("remove needs a title".to_string());
                }
                ShellCommand::Remove(bank, title)
            }
            "flash" => ShellCommand::Flash(bank(words.next())?),
            "format" => ShellCommand::Format(bank(words.next())?),
            "scan" => ShellCommand::Scan(optional_bank(words.next())?),
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

fn prompt(state: &AppState) {
    let marker = if state.is_busy() { "busy" } else { "ready" };
    print!("emsdeck [{}]> ", marker);
    let _ = std::io::stdout().flush();
}

fn print_notices(state: &mut AppState) -> bool {
    let notices = state.take_notices();
    let idle = notices.contains(&Notice::Idle);
    for notice in notices {
        println!("{}", notice);
    }
    idle
}

fn print_banks(state: &AppState, bank: Option<BankId>) {
    let banks = match bank {
        Some(bank) => vec![bank],
        None => BankId::ALL.to_vec(),
    };
    for bank in banks {
        print!("{}", format_bank(state.catalog(), bank));
    }
}

fn print_matches(state: &AppState, bank: BankId, query: &str) {
    let matches = state.catalog().search(bank, query);
    if matches.is_empty() {
        println!("🔍 No title on bank {} contains '{}'", bank, query);
        return;
    }
    println!("🔍 Bank {}: {} match(es) for '{}'", bank, matches.len(), query);
    for entry in matches {
        print!("{}", format_entry(entry));
    }
}

/// Apply one command; returns false when the shell should exit
fn execute(state: &mut AppState, command: ShellCommand) -> bool {
    let result = match command {
        ShellCommand::Quit => {
            if state.is_busy() {
                println!("⚠️  Operations are still running; leaving anyway");
            }
            return false;
        }
        ShellCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
        ShellCommand::List(bank) => {
            print_banks(state, bank);
            Ok(())
        }
        ShellCommand::Find(bank, query) => {
            print_matches(state, bank, &query);
            Ok(())
        }
        ShellCommand::Add(bank, files) => {
            for file in files {
                match state.add_file(bank, &file) {
                    Ok(title) => println!("➕ {} queued for bank {}", title, bank),
                    Err(e) => println!("❌ {}: {}", file.display(), e),
                }
            }
            Ok(())
        }
        ShellCommand::Remove(bank, title) => state.remove(bank, &title).map(|outcome| match outcome {
            RemovalOutcome::Marked => println!("🗑️  {} will be removed on the next flash", title),
            RemovalOutcome::Deleted => println!("🗑️  {} dropped from the queue", title),
        }),
        ShellCommand::Flash(bank) => state.flash(bank).map(|_| ()),
        ShellCommand::Format(bank) => state.format(bank),
        ShellCommand::Scan(Some(bank)) => state.scan(bank),
        ShellCommand::Scan(None) => state.scan_all(),
    };

    if let Err(e) = result {
        println!("❌ {}", e);
    }
    true
}

/// Run the interactive shell until `quit` or end of input
pub async fn run_shell(config: &AppConfig) -> Result<()> {
    let (mut state, mut rx) = create_app_state(config);

    println!(
        "🎮 EMS Deck {} - using {}",
        crate::VERSION,
        config.flasher.program.display()
    );
    println!("Type 'help' for commands. Reading the cartridge...");
    state.scan_all()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(&state);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match ShellCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if !execute(&mut state, command) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("❌ {}", e),
                }
                print_notices(&mut state);
                prompt(&state);
            }
            Some(event) = rx.recv() => {
                state.handle_event(event);
                if state.notices().is_empty() {
                    continue;
                }
                println!();
                if print_notices(&mut state) {
                    print_banks(&state, None);
                }
                prompt(&state);
            }
        }
    }

    log::info!("Shell closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("   "), Ok(None));
        assert_eq!(
            ShellCommand::parse("add 1 a.gb b.gbc"),
            Ok(Some(ShellCommand::Add(
                BankId::One,
                vec![PathBuf::from("a.gb"), PathBuf::from("b.gbc")]
            )))
        );
        assert_eq!(
            ShellCommand::parse("remove 2 POKEMON RED"),
            Ok(Some(ShellCommand::Remove(BankId::Two, "POKEMON RED".to_string())))
        );
        assert_eq!(ShellCommand::parse("scan"), Ok(Some(ShellCommand::Scan(None))));
        assert_eq!(
            ShellCommand::parse("LIST 2"),
            Ok(Some(ShellCommand::List(Some(BankId::Two))))
        );
        assert_eq!(ShellCommand::parse("q"), Ok(Some(ShellCommand::Quit)));
        assert_eq!(
            ShellCommand::parse("find 1 pokemon red"),
            Ok(Some(ShellCommand::Find(BankId::One, "pokemon red".to_string())))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ShellCommand::parse("flash").is_err());
        assert!(ShellCommand::parse("flash 3").is_err());
        assert!(ShellCommand::parse("add 1").is_err());
        assert!(ShellCommand::parse("remove 1").is_err());
        assert!(ShellCommand::parse("find 2").is_err());
        assert!(ShellCommand::parse("dance").is_err());
    }
}
