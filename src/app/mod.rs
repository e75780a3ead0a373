//! Coordinator: single owner of all mutable front-end state

pub mod state;

pub use state::*;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::catalog::CatalogStore;
use crate::config::AppConfig;
use crate::models::AppEvent;
use crate::services::flasher::{EmsFlasher, FlasherBackend};
use crate::services::runner::{OperationRunner, RetryPolicy};

/// Build a coordinator around an arbitrary backend
pub fn create_app_state_with_backend(
    backend: Arc<dyn FlasherBackend>,
    policy: RetryPolicy,
    bank_capacity_kb: u32,
) -> (AppState, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let runner = OperationRunner::new(backend, policy, tx);
    let state = AppState::new(CatalogStore::new(bank_capacity_kb), runner);
    (state, rx)
}

/// Build a coordinator that drives the configured `ems-flasher`
pub fn create_app_state(config: &AppConfig) -> (AppState, mpsc::UnboundedReceiver<AppEvent>) {
    create_app_state_with_backend(
        Arc::new(EmsFlasher::from_config(&config.flasher)),
        RetryPolicy::from_config(&config.flasher),
        config.catalog.bank_capacity_kb,
    )
}
