//! Application configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_BANK_CAPACITY_KB;
use crate::errors::{EmsError, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External flasher invocation
    pub flasher: FlasherConfig,
    /// Cartridge geometry
    pub catalog: CatalogConfig,
    /// UI configuration
    pub ui: UiConfig,
}

/// External flasher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlasherConfig {
    /// Path or name of the `ems-flasher` executable
    pub program: PathBuf,
    /// Delay before every attempt, in milliseconds
    pub settle_delay_ms: u64,
    /// Attempts per operation before giving up
    pub max_attempts: u32,
}

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Capacity of each bank in KB
    pub bank_capacity_kb: u32,
}

/// UI-related configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Log level used when no -v/-q flag is given
    pub log_level: String,
}

impl Default for FlasherConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ems-flasher"),
            settle_delay_ms: 500,
            max_attempts: 3,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bank_capacity_kb: DEFAULT_BANK_CAPACITY_KB,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/emsdeck/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(crate::APP_NAME).join("config.toml"))
    }

    /// Load from an explicit path, or from the default location if present.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EmsError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
