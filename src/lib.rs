//! EMS Deck - front-end for the ems-flasher cartridge utility
//!
//! EMS Deck keeps a catalog of the ROMs on both banks of an EMS Game Boy
//! flash cartridge, queues additions and removals, and drives the external
//! `ems-flasher` tool to apply them.

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use errors::*;
pub use models::*;

/// EMS Deck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// EMS Deck application name
pub const APP_NAME: &str = "emsdeck";
