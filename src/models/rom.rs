//! ROM catalog data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Bank id shown for entries that have not been written yet
pub const UNWRITTEN_BANK_ID: &str = "N/A";

/// One of the two independent storage partitions ("pages") of the cartridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankId {
    One,
    Two,
}

impl BankId {
    pub const ALL: [BankId; 2] = [BankId::One, BankId::Two];

    pub fn index(self) -> usize {
        match self {
            BankId::One => 0,
            BankId::Two => 1,
        }
    }

    /// Value passed to `--bank` on the flasher command line
    pub fn as_arg(self) -> &'static str {
        match self {
            BankId::One => "1",
            BankId::Two => "2",
        }
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

impl FromStr for BankId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(BankId::One),
            "2" => Ok(BankId::Two),
            other => Err(format!("invalid bank '{}', expected 1 or 2", other)),
        }
    }
}

/// Where a catalog entry stands relative to the physical cartridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RomStatus {
    ReadyToFlash,
    ToBeRemoved,
    OnCartridge,
}

impl RomStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RomStatus::ReadyToFlash => "Ready to flash",
            RomStatus::ToBeRemoved => "To be removed",
            RomStatus::OnCartridge => "On cartridge",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RomStatus::ReadyToFlash => "+",
            RomStatus::ToBeRemoved => "-",
            RomStatus::OnCartridge => " ",
        }
    }
}

/// One ROM row in a bank table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomEntry {
    /// Display name or scanned cartridge title
    pub title: String,
    pub size_kb: u32,
    pub status: RomStatus,
    /// Bank id reported by the flasher, `N/A` until written
    pub bank_id_on_cartridge: String,
    /// Local file for entries waiting to be written
    pub source_path: Option<PathBuf>,
    /// Enhancements column of the scan (SGB, GBC, ...)
    #[serde(default)]
    pub enhancements: String,
}

impl RomEntry {
    /// Entry for a local file selected by the user
    pub fn ready_to_flash(title: impl Into<String>, size_kb: u32, source_path: PathBuf) -> Self {
        Self {
            title: title.into(),
            size_kb,
            status: RomStatus::ReadyToFlash,
            bank_id_on_cartridge: UNWRITTEN_BANK_ID.to_string(),
            source_path: Some(source_path),
            enhancements: String::new(),
        }
    }

    /// Entry reported by a cartridge scan
    pub fn on_cartridge(
        bank_id: impl Into<String>,
        title: impl Into<String>,
        size_kb: u32,
        enhancements: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            size_kb,
            status: RomStatus::OnCartridge,
            bank_id_on_cartridge: bank_id.into(),
            source_path: None,
            enhancements: enhancements.into(),
        }
    }

    /// Whether the ROM currently occupies space on the cartridge
    pub fn is_physical(&self) -> bool {
        matches!(self.status, RomStatus::OnCartridge | RomStatus::ToBeRemoved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_id_parsing() {
        assert_eq!("1".parse::<BankId>(), Ok(BankId::One));
        assert_eq!(" 2 ".parse::<BankId>(), Ok(BankId::Two));
        assert!("3".parse::<BankId>().is_err());
        assert!("".parse::<BankId>().is_err());
    }

    #[test]
    fn test_new_entries_carry_expected_defaults() {
        let local = RomEntry::ready_to_flash("TETRIS", 32, PathBuf::from("/roms/tetris.gb"));
        assert_eq!(local.bank_id_on_cartridge, UNWRITTEN_BANK_ID);
        assert!(!local.is_physical());

        let scanned = RomEntry::on_cartridge("0", "TETRIS", 32, "");
        assert_eq!(scanned.source_path, None);
        assert!(scanned.is_physical());
    }
}
