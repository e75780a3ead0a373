//! Per-bank ROM tables and their reconciliation with cartridge scans

use std::path::PathBuf;

use crate::errors::{EmsError, Result};
use crate::models::{BankId, RomEntry, RomStatus};

/// Capacity of one bank: 32 MB expressed in KB
pub const DEFAULT_BANK_CAPACITY_KB: u32 = 32 * 1024;

/// Result of `CatalogStore::mark_for_removal`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The ROM is on the cartridge and will be deleted on the next flash
    Marked,
    /// The ROM was only queued and has been dropped from the table
    Deleted,
}

/// Work extracted from a bank by `CatalogStore::partition_pending`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChanges {
    /// Cartridge bank ids of ROMs to delete
    pub removals: Vec<String>,
    /// Local files to write
    pub writes: Vec<PathBuf>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.writes.is_empty()
    }
}

/// One logical partition of the cartridge
#[derive(Debug, Clone, Default)]
pub struct Bank {
    entries: Vec<RomEntry>,
    occupied_kb: u32,
}

impl Bank {
    pub fn entries(&self) -> &[RomEntry] {
        &self.entries
    }

    pub fn occupied_kb(&self) -> u32 {
        self.occupied_kb
    }

    fn position(&self, title: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.title == title)
    }

    fn recompute_occupied(&mut self) {
        self.occupied_kb = self
            .entries
            .iter()
            .filter(|e| e.is_physical())
            .map(|e| e.size_kb)
            .sum();
    }
}

/// In-memory catalog of both cartridge banks
#[derive(Debug, Clone)]
pub struct CatalogStore {
    banks: [Bank; 2],
    capacity_kb: u32,
}

impl CatalogStore {
    pub fn new(capacity_kb: u32) -> Self {
        Self {
            banks: [Bank::default(), Bank::default()],
            capacity_kb,
        }
    }

    pub fn bank(&self, bank: BankId) -> &Bank {
        &self.banks[bank.index()]
    }

    fn bank_mut(&mut self, bank: BankId) -> &mut Bank {
        &mut self.banks[bank.index()]
    }

    pub fn entries(&self, bank: BankId) -> &[RomEntry] {
        self.bank(bank).entries()
    }

    pub fn capacity_kb(&self) -> u32 {
        self.capacity_kb
    }

    pub fn occupied_kb(&self, bank: BankId) -> u32 {
        self.bank(bank).occupied_kb
    }

    pub fn remaining_kb(&self, bank: BankId) -> u32 {
        self.capacity_kb.saturating_sub(self.occupied_kb(bank))
    }

    /// Size of the ROMs queued for writing
    pub fn pending_write_kb(&self, bank: BankId) -> u32 {
        self.entries(bank)
            .iter()
            .filter(|e| e.status == RomStatus::ReadyToFlash)
            .map(|e| e.size_kb)
            .sum()
    }

    /// Look a title up in both banks
    pub fn find(&self, title: &str) -> Option<(BankId, &RomEntry)> {
        BankId::ALL.into_iter().find_map(|bank| {
            self.entries(bank)
                .iter()
                .find(|e| e.title == title)
                .map(|e| (bank, e))
        })
    }

    /// Queue an entry; titles must be unique across both banks.
    pub fn add_entry(&mut self, bank: BankId, entry: RomEntry) -> Result<()> {
        if self.find(&entry.title).is_some() {
            log::warn!("Rejected duplicate title '{}'", entry.title);
            return Err(EmsError::DuplicateTitle(entry.title));
        }

        log::debug!("Bank {}: queued '{}' ({} KB)", bank, entry.title, entry.size_kb);
        self.bank_mut(bank).entries.push(entry);
        Ok(())
    }

    /// On-cartridge ROMs are marked; anything else has no physical copy and is dropped.
    pub fn mark_for_removal(&mut self, bank: BankId, title: &str) -> Result<RemovalOutcome> {
        let target = self.bank_mut(bank);
        // With duplicate titles on the cartridge, mark a copy that is not marked yet
        let index = target
            .entries
            .iter()
            .position(|e| e.title == title && e.status == RomStatus::OnCartridge)
            .or_else(|| target.position(title))
            .ok_or_else(|| EmsError::NotFound(title.to_string()))?;

        if target.entries[index].status == RomStatus::OnCartridge {
            target.entries[index].status = RomStatus::ToBeRemoved;
            log::debug!("Bank {}: '{}' marked for removal", bank, title);
            Ok(RemovalOutcome::Marked)
        } else {
            let entry = target.entries.remove(index);
            target.recompute_occupied();
            log::debug!("Bank {}: dropped '{}' ({:?})", bank, title, entry.status);
            Ok(RemovalOutcome::Deleted)
        }
    }

    /// Replace the bank's cartridge view with a fresh scan.
    ///
    /// Every parsed row ends up in the table. Rows from before the scan are
    /// reconciled at most once each: a pending removal is matched on title
    /// and cartridge id first, then on title alone (the ROM moved), and a
    /// queued copy of a scanned title is superseded.
    pub fn apply_scan(&mut self, bank: BankId, parsed: Vec<RomEntry>) {
        let queued_elsewhere: Vec<String> = BankId::ALL
            .into_iter()
            .filter(|other| *other != bank)
            .flat_map(|other| self.entries(other).iter())
            .filter(|e| e.status == RomStatus::ReadyToFlash)
            .map(|e| e.title.clone())
            .collect();

        let target = self.bank_mut(bank);
        let mut rows: Vec<RomEntry> = std::mem::take(&mut target.entries)
            .into_iter()
            .filter(|e| e.status != RomStatus::OnCartridge)
            .collect();
        // Rows already taken by this scan
        let mut claimed = vec![false; rows.len()];

        let mut unmatched = Vec::new();
        for mut entry in parsed {
            entry.status = RomStatus::OnCartridge;
            entry.source_path = None;

            let exact = (0..rows.len()).find(|&i| {
                !claimed[i]
                    && rows[i].status == RomStatus::ToBeRemoved
                    && rows[i].title == entry.title
                    && rows[i].bank_id_on_cartridge == entry.bank_id_on_cartridge
            });
            match exact {
                Some(i) => {
                    claimed[i] = true;
                    refresh_pending_removal(&mut rows[i], entry);
                }
                None => unmatched.push(entry),
            }
        }

        for entry in unmatched {
            if queued_elsewhere.contains(&entry.title) {
                log::warn!(
                    "Bank {}: '{}' is on the cartridge but also queued for the other bank",
                    bank,
                    entry.title
                );
            }

            let index = (0..rows.len()).find(|&i| !claimed[i] && rows[i].title == entry.title);
            match index {
                Some(i) if rows[i].status == RomStatus::ToBeRemoved => {
                    claimed[i] = true;
                    refresh_pending_removal(&mut rows[i], entry);
                }
                Some(i) => {
                    log::warn!(
                        "Bank {}: '{}' is already on the cartridge, dropping the queued copy",
                        bank,
                        entry.title
                    );
                    claimed[i] = true;
                    rows[i] = entry;
                }
                None => {
                    claimed.push(true);
                    rows.push(entry);
                }
            }
        }

        target.entries = rows;
        target.recompute_occupied();
        log::info!(
            "Bank {}: {} KB used, {} KB free",
            bank,
            self.occupied_kb(bank),
            self.remaining_kb(bank)
        );
    }

    /// Entries of `bank` whose title contains `query`, ignoring case.
    /// An empty query matches everything.
    pub fn search(&self, bank: BankId, query: &str) -> Vec<&RomEntry> {
        let needle = query.trim().to_lowercase();
        self.entries(bank)
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Take the pending removals and writes out of the bank.
    ///
    /// The entries are dropped before the flasher confirms anything; a failed
    /// flash is recovered by rescanning, not by restoring them.
    pub fn partition_pending(&mut self, bank: BankId) -> PendingChanges {
        let target = self.bank_mut(bank);
        let mut changes = PendingChanges::default();

        target.entries.retain(|e| match e.status {
            RomStatus::ToBeRemoved => {
                changes.removals.push(e.bank_id_on_cartridge.clone());
                false
            }
            RomStatus::ReadyToFlash => match &e.source_path {
                Some(path) => {
                    changes.writes.push(path.clone());
                    false
                }
                None => true,
            },
            RomStatus::OnCartridge => true,
        });

        target.recompute_occupied();
        changes
    }

    /// Refuse a flash whose result would not fit into the bank
    pub fn check_capacity(&self, bank: BankId) -> Result<()> {
        let kept: u64 = self
            .entries(bank)
            .iter()
            .filter(|e| e.status == RomStatus::OnCartridge)
            .map(|e| u64::from(e.size_kb))
            .sum();
        let needed_kb = kept + u64::from(self.pending_write_kb(bank));
        let capacity_kb = u64::from(self.capacity_kb);

        if needed_kb > capacity_kb {
            return Err(EmsError::CapacityExceeded {
                needed_kb,
                capacity_kb,
            });
        }
        Ok(())
    }
}

fn refresh_pending_removal(pending: &mut RomEntry, scanned: RomEntry) {
    pending.bank_id_on_cartridge = scanned.bank_id_on_cartridge;
    pending.size_kb = scanned.size_kb;
    pending.enhancements = scanned.enhancements;
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(DEFAULT_BANK_CAPACITY_KB)
    }
}
