//! Error handling for EMS Deck

pub mod types;

pub use types::*;
