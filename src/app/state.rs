//! Coordinator state
//!
//! `AppState` is the single owner of the catalog, the runner bookkeeping and
//! the busy flag. Workers never reach it; their events are fed in through
//! `handle_event` by whoever drains the channel.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use tokio::sync::mpsc;

use crate::catalog::{CatalogStore, PendingChanges, RemovalOutcome, RomFile, parse_scan_output};
use crate::errors::{EmsError, Result};
use crate::models::{
    AppEvent, BankId, FailureCause, FollowUp, Operation, OperationOutcome,
};
use crate::services::runner::{Completion, OperationRunner};

/// Message surfaced to the user by the front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    /// An operation reached `FailedTerminal`, or its output was unusable
    OperationFailed { label: String, message: String },
    /// All submitted work is done and controls are enabled again
    Idle,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Info(msg) => write!(f, "ℹ️  {}", msg),
            Notice::OperationFailed { label, message } => write!(f, "❌ {}: {}", label, message),
            Notice::Idle => write!(f, "✅ Ready"),
        }
    }
}

pub struct AppState {
    catalog: CatalogStore,
    runner: OperationRunner,
    queued: VecDeque<Vec<Operation>>,
    busy: bool,
    notices: Vec<Notice>,
}

impl AppState {
    pub fn new(catalog: CatalogStore, runner: OperationRunner) -> Self {
        Self {
            catalog,
            runner,
            queued: VecDeque::new(),
            busy: false,
            notices: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Direct catalog access for the coordinating task
    pub fn catalog_mut(&mut self) -> &mut CatalogStore {
        &mut self.catalog
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.busy {
            return Err(EmsError::Busy);
        }
        Ok(())
    }

    /// Queue a local ROM file for writing to `bank`
    pub fn add_file(&mut self, bank: BankId, path: &Path) -> Result<String> {
        self.ensure_idle()?;
        let rom = RomFile::load(path)?;
        let title = rom.title.clone();
        self.catalog.add_entry(bank, rom.into_entry())?;
        Ok(title)
    }

    pub fn remove(&mut self, bank: BankId, title: &str) -> Result<RemovalOutcome> {
        self.ensure_idle()?;
        self.catalog.mark_for_removal(bank, title)
    }

    pub fn scan(&mut self, bank: BankId) -> Result<()> {
        self.ensure_idle()?;
        self.enqueue(vec![vec![Operation::scan(bank)]]);
        Ok(())
    }

    /// Scan both banks concurrently as one chain
    pub fn scan_all(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.enqueue(vec![BankId::ALL.into_iter().map(Operation::scan).collect()]);
        Ok(())
    }

    /// Apply the bank's pending changes: deletions, then writes, then a rescan.
    pub fn flash(&mut self, bank: BankId) -> Result<PendingChanges> {
        self.ensure_idle()?;
        self.catalog.check_capacity(bank)?;

        let changes = self.catalog.partition_pending(bank);
        if changes.is_empty() {
            self.notices
                .push(Notice::Info(format!("Bank {}: nothing to flash", bank)));
            return Ok(changes);
        }

        let mut chains = Vec::new();
        if !changes.removals.is_empty() {
            chains.push(vec![Operation::delete(bank, &changes.removals)]);
        }
        if !changes.writes.is_empty() {
            chains.push(vec![Operation::write(bank, &changes.writes)]);
        }
        chains.push(vec![Operation::scan(bank)]);

        log::info!(
            "Bank {}: flashing {} removal(s) and {} write(s)",
            bank,
            changes.removals.len(),
            changes.writes.len()
        );
        self.enqueue(chains);
        Ok(changes)
    }

    /// Submit a caller-built chain. Its operations run concurrently and
    /// complete in no particular order.
    pub fn submit_chain(&mut self, chain: Vec<Operation>) -> Result<()> {
        self.ensure_idle()?;
        self.enqueue(vec![chain]);
        Ok(())
    }

    /// Erase the bank and rescan it
    pub fn format(&mut self, bank: BankId) -> Result<()> {
        self.ensure_idle()?;
        self.enqueue(vec![
            vec![Operation::format(bank)],
            vec![Operation::scan(bank)],
        ]);
        Ok(())
    }

    fn enqueue(&mut self, chains: Vec<Vec<Operation>>) {
        self.queued.extend(chains);
        self.submit_next();
    }

    /// Start the next queued chain once the runner has drained
    fn submit_next(&mut self) {
        if self.runner.is_busy() {
            return;
        }
        while let Some(chain) = self.queued.pop_front() {
            if self.runner.submit(chain).is_some() {
                self.busy = true;
                return;
            }
        }
    }

    /// Apply one worker event. Must only be called from the coordinating task.
    pub fn handle_event(&mut self, event: AppEvent) {
        self.runner.observe(&event);

        match event {
            AppEvent::OperationStarted(id, label) => {
                log::info!("▶ {} {}", label, id);
            }
            AppEvent::OperationAttemptFailed {
                id,
                attempt,
                exit_code,
            } => {
                log::warn!(
                    "Operation {} attempt {} failed (exit {:?}), retrying",
                    id,
                    attempt,
                    exit_code
                );
            }
            AppEvent::OperationFinished(id, outcome) => match self.runner.complete(id, outcome) {
                Some(completion) => self.apply_completion(completion),
                None => log::warn!("Ignoring completion for unknown operation {}", id),
            },
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        let Completion {
            id,
            label,
            follow_up,
            error_message,
            outcome,
            chain_finished,
            ..
        } = completion;

        match outcome {
            OperationOutcome::Succeeded { stdout, attempts } => {
                log::info!("✔ {} {} succeeded after {} attempt(s)", label, id, attempts);
                if let Some(follow_up) = follow_up {
                    self.run_follow_up(follow_up, &label, &stdout);
                }
            }
            OperationOutcome::Failed { attempts, cause } => {
                let message = match cause {
                    // Already rendered from the launch error
                    FailureCause::Launch(detail) => detail,
                    FailureCause::ExitStatus { code, stderr } => {
                        log::error!(
                            "✖ {} {} gave up after {} attempt(s), exit {:?}: {}",
                            label,
                            id,
                            attempts,
                            code,
                            stderr.trim()
                        );
                        error_message
                    }
                };
                self.notices.push(Notice::OperationFailed { label, message });
            }
        }

        if chain_finished {
            self.submit_next();
            if !self.runner.is_busy() && self.queued.is_empty() {
                self.busy = false;
                self.notices.push(Notice::Idle);
            }
        }
    }

    fn run_follow_up(&mut self, follow_up: FollowUp, label: &str, stdout: &str) {
        match follow_up {
            FollowUp::ApplyScan(bank) => match parse_scan_output(stdout) {
                Ok(entries) => {
                    let count = entries.len();
                    self.catalog.apply_scan(bank, entries);
                    self.notices.push(Notice::Info(format!(
                        "Bank {}: {} ROM(s) on cartridge, {} KB free",
                        bank,
                        count,
                        self.catalog.remaining_kb(bank)
                    )));
                }
                Err(e) => {
                    log::error!("Could not apply scan of bank {}: {}", bank, e);
                    self.notices.push(Notice::OperationFailed {
                        label: label.to_string(),
                        message: e.to_string(),
                    });
                }
            },
        }
    }

    /// Drain worker events until all submitted and queued work is done
    pub async fn run_until_idle(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    ) -> Result<()> {
        while self.busy {
            match rx.recv().await {
                Some(event) => self.handle_event(event),
                None => {
                    return Err(EmsError::OperationFailed(
                        "worker channel closed while operations were running".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
