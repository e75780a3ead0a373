//! Custom error types for EMS Deck

use std::fmt;

/// Main error type for EMS Deck operations
#[derive(Debug)]
pub enum EmsError {
    /// A title is already queued or present in one of the banks
    DuplicateTitle(String),
    /// No entry with this title in the bank
    NotFound(String),
    /// External tool exited non-zero on every attempt
    OperationFailed(String),
    /// External tool could not be launched at all
    ToolUnavailable(String),
    /// A scan row that could not be sliced into columns
    MalformedScanRow(String),
    /// Scan output without a usable header row
    ScanFormat(String),
    /// Selected file is not a usable Game Boy ROM
    InvalidRomFile(String),
    /// Pending writes do not fit into the bank
    CapacityExceeded { needed_kb: u64, capacity_kb: u64 },
    /// Operations are still running; user actions are disabled
    Busy,
    /// Configuration related errors
    Config(String),
    /// General I/O errors
    Io(std::io::Error),
}

impl fmt::Display for EmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmsError::DuplicateTitle(title) => {
                write!(f, "Duplicate title: '{}' is already in the catalog", title)
            }
            EmsError::NotFound(title) => write!(f, "No ROM titled '{}' in this bank", title),
            EmsError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            EmsError::ToolUnavailable(msg) => write!(f, "Flasher tool unavailable: {}", msg),
            EmsError::MalformedScanRow(row) => write!(f, "Malformed scan row: {:?}", row),
            EmsError::ScanFormat(msg) => write!(f, "Unrecognised scan output: {}", msg),
            EmsError::InvalidRomFile(msg) => write!(f, "Invalid ROM file: {}", msg),
            EmsError::CapacityExceeded {
                needed_kb,
                capacity_kb,
            } => write!(
                f,
                "Not enough space: {} KB needed, bank holds {} KB",
                needed_kb, capacity_kb
            ),
            EmsError::Busy => write!(f, "Operations are still running, try again when idle"),
            EmsError::Config(msg) => write!(f, "Configuration error: {}", msg),
            EmsError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for EmsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EmsError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EmsError {
    fn from(err: std::io::Error) -> Self {
        EmsError::Io(err)
    }
}

impl From<toml::de::Error> for EmsError {
    fn from(err: toml::de::Error) -> Self {
        EmsError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EmsError {
    fn from(err: toml::ser::Error) -> Self {
        EmsError::Config(err.to_string())
    }
}

/// Result type alias for EMS Deck operations
pub type Result<T> = std::result::Result<T, EmsError>;
