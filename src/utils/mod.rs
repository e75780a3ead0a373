//! Utility functions and helpers used throughout EMS Deck

pub mod logging;
