//! Configuration management for EMS Deck

pub mod app_config;

pub use app_config::*;
