//! Events posted by operation workers to the coordinator

use crate::models::operation::{OperationId, OperationOutcome};

/// Application events for communication between workers and the coordinator
#[derive(Debug)]
pub enum AppEvent {
    OperationStarted(OperationId, String), // id, label
    OperationAttemptFailed {
        id: OperationId,
        attempt: u32,
        exit_code: Option<i32>,
    },
    OperationFinished(OperationId, OperationOutcome),
}
