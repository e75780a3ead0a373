//! External flasher operation descriptors

use std::fmt;
use std::path::PathBuf;

use crate::models::rom::BankId;

pub type ChainId = u64;

/// Identifies one operation inside a submitted chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId {
    pub chain: ChainId,
    pub index: usize,
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.chain, self.index)
    }
}

/// What the coordinator does with the captured output of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Parse the output as a title listing and reconcile the bank with it
    ApplyScan(BankId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Scan,
    Write,
    Delete,
    Format,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Scan => "scan",
            OperationKind::Write => "write",
            OperationKind::Delete => "delete",
            OperationKind::Format => "format",
        }
    }
}

/// A single invocation of the external flasher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub bank: BankId,
    pub args: Vec<String>,
    pub follow_up: Option<FollowUp>,
    /// Shown to the user when every attempt failed
    pub error_message: String,
}

impl Operation {
    fn bank_args(bank: BankId, flag: &str) -> Vec<String> {
        vec!["--bank".to_string(), bank.as_arg().to_string(), flag.to_string()]
    }

    /// `--bank <n> --title`, reconciled into the catalog on success
    pub fn scan(bank: BankId) -> Self {
        Self {
            kind: OperationKind::Scan,
            bank,
            args: Self::bank_args(bank, "--title"),
            follow_up: Some(FollowUp::ApplyScan(bank)),
            error_message: format!(
                "Could not read the titles of bank {}. Is the cartridge connected?",
                bank
            ),
        }
    }

    /// `--bank <n> --write <paths...>`
    pub fn write(bank: BankId, paths: &[PathBuf]) -> Self {
        let mut args = Self::bank_args(bank, "--write");
        args.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        Self {
            kind: OperationKind::Write,
            bank,
            args,
            follow_up: None,
            error_message: format!("Writing {} ROM(s) to bank {} failed.", paths.len(), bank),
        }
    }

    /// `--bank <n> --delete <ids...>`
    pub fn delete(bank: BankId, ids: &[String]) -> Self {
        let mut args = Self::bank_args(bank, "--delete");
        args.extend(ids.iter().cloned());
        Self {
            kind: OperationKind::Delete,
            bank,
            args,
            follow_up: None,
            error_message: format!("Removing {} ROM(s) from bank {} failed.", ids.len(), bank),
        }
    }

    /// `--bank <n> --format`
    pub fn format(bank: BankId) -> Self {
        Self {
            kind: OperationKind::Format,
            bank,
            args: Self::bank_args(bank, "--format"),
            follow_up: None,
            error_message: format!("Formatting bank {} failed.", bank),
        }
    }

    pub fn label(&self) -> String {
        format!("{} bank {}", self.kind.name(), self.bank)
    }
}

/// Lifecycle of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Running,
    Succeeded,
    /// An attempt failed and another one will follow
    FailedRetryable,
    FailedTerminal,
}

/// Why an operation ended up in `FailedTerminal`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The tool ran and exited non-zero on the last attempt
    ExitStatus { code: Option<i32>, stderr: String },
    /// The tool could not be started
    Launch(String),
}

/// Terminal result reported by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded { stdout: String, attempts: u32 },
    Failed { attempts: u32, cause: FailureCause },
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            OperationOutcome::Succeeded { attempts, .. }
            | OperationOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}
