//! Mock flasher simulating an EMS cartridge
//!
//! Answers the same command lines as `ems-flasher` against an in-memory
//! cartridge, records every call and supports failure injection.
#![allow(dead_code)]

use async_trait::async_trait;
use emsdeck::catalog::RomFile;
use emsdeck::errors::{EmsError, Result};
use emsdeck::models::BankId;
use emsdeck::services::{FlasherBackend, ToolOutput};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::test_fixtures::ListingFixtures;

/// One ROM stored on the simulated cartridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRom {
    pub id: u32,
    pub title: String,
    pub size_kb: u32,
}

/// Fail calls using `flag` for the next `remaining` invocations
#[derive(Debug, Clone)]
struct FailureRule {
    flag: String,
    remaining: u32,
    exit_code: i32,
}

#[derive(Debug, Default)]
struct MockState {
    banks: [Vec<MockRom>; 2],
    next_id: [u32; 2],
    calls: Vec<Vec<String>>,
    failures: Vec<FailureRule>,
    listing_override: Option<String>,
    unavailable: bool,
}

#[derive(Debug, Default)]
pub struct MockCartridge {
    state: Mutex<MockState>,
}

impl MockCartridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Put a ROM on the cartridge, returning its bank id
    pub fn insert(&self, bank: BankId, title: &str, size_kb: u32) -> u32 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id[bank.index()];
        state.next_id[bank.index()] += 1;
        state.banks[bank.index()].push(MockRom {
            id,
            title: title.to_string(),
            size_kb,
        });
        id
    }

    pub fn fail_next(&self, flag: &str, times: u32, exit_code: i32) {
        self.state.lock().unwrap().failures.push(FailureRule {
            flag: flag.to_string(),
            remaining: times,
            exit_code,
        });
    }

    pub fn fail_always(&self, flag: &str) {
        self.fail_next(flag, u32::MAX, 1);
    }

    /// Answer `--title` with this text instead of the real listing
    pub fn override_listing(&self, text: &str) {
        self.state.lock().unwrap().listing_override = Some(text.to_string());
    }

    /// Behave as if the executable did not exist
    pub fn make_unavailable(&self) {
        self.state.lock().unwrap().unavailable = true;
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Flags (`--title`, `--write`, ...) of every call, in order
    pub fn call_flags(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|args| args.get(2).cloned())
            .collect()
    }

    pub fn count_calls(&self, flag: &str) -> usize {
        self.call_flags().iter().filter(|f| *f == flag).count()
    }

    pub fn roms(&self, bank: BankId) -> Vec<MockRom> {
        self.state.lock().unwrap().banks[bank.index()].clone()
    }

    pub fn titles(&self, bank: BankId) -> Vec<String> {
        self.roms(bank).into_iter().map(|r| r.title).collect()
    }

    fn listing(state: &MockState, bank: usize) -> String {
        let rows: Vec<String> = state.banks[bank]
            .iter()
            .map(|rom| {
                ListingFixtures::row(
                    &rom.id.to_string(),
                    &rom.title,
                    &format!("{}KB", rom.size_kb),
                    "",
                )
            })
            .collect();
        ListingFixtures::listing(&rows)
    }
}

fn exit(code: i32, stdout: String) -> ToolOutput {
    ToolOutput {
        exit_code: Some(code),
        stdout,
        stderr: if code == 0 {
            String::new()
        } else {
            "simulated failure".to_string()
        },
    }
}

#[async_trait]
impl FlasherBackend for MockCartridge {
    async fn invoke(&self, args: &[String]) -> Result<ToolOutput> {
        let mut state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(EmsError::ToolUnavailable("mock flasher missing".to_string()));
        }
        state.calls.push(args.to_vec());

        let (bank, flag, rest) = match args {
            [bank_flag, bank, flag, rest @ ..] if bank_flag == "--bank" => {
                match bank.parse::<BankId>() {
                    Ok(bank) => (bank.index(), flag.as_str(), rest),
                    Err(_) => return Ok(exit(2, String::new())),
                }
            }
            _ => return Ok(exit(2, String::new())),
        };

        if let Some(rule) = state
            .failures
            .iter_mut()
            .find(|rule| rule.flag == flag && rule.remaining > 0)
        {
            rule.remaining -= 1;
            return Ok(exit(rule.exit_code, String::new()));
        }

        match flag {
            "--title" => {
                let listing = match &state.listing_override {
                    Some(text) => text.clone(),
                    None => Self::listing(&state, bank),
                };
                Ok(exit(0, listing))
            }
            "--write" => {
                for path in rest {
                    let rom = match RomFile::load(Path::new(path)) {
                        Ok(rom) => rom,
                        Err(_) => return Ok(exit(1, String::new())),
                    };
                    let id = state.next_id[bank];
                    state.next_id[bank] += 1;
                    state.banks[bank].push(MockRom {
                        id,
                        title: rom.title.clone(),
                        size_kb: rom.size_kb(),
                    });
                }
                Ok(exit(0, String::new()))
            }
            "--delete" => {
                state.banks[bank].retain(|rom| !rest.contains(&rom.id.to_string()));
                Ok(exit(0, String::new()))
            }
            "--format" => {
                state.banks[bank].clear();
                Ok(exit(0, String::new()))
            }
            _ => Ok(exit(2, String::new())),
        }
    }

    fn describe(&self) -> String {
        "mock cartridge".to_string()
    }
}
