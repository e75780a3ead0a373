//! Operation runner for the external flasher
//!
//! Every operation of a submitted chain gets its own worker task. Workers only
//! see an argument list; they report back through the event channel and never
//! touch catalog state. The bookkeeping kept here (follow-ups, error messages,
//! per-chain counters) is owned by the coordinator and only mutated from it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::FlasherConfig;
use crate::models::{
    AppEvent, ChainId, FailureCause, FollowUp, Operation, OperationId, OperationOutcome,
    OperationState,
};
use crate::services::flasher::FlasherBackend;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Retry bound and settle delay applied to every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait before each attempt; the cartridge needs time after any access
    pub settle_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FlasherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }

    /// No settle delay, used where no hardware is involved
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            settle_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

#[derive(Debug)]
struct InFlight {
    label: String,
    follow_up: Option<FollowUp>,
    error_message: String,
    state: OperationState,
}

/// A finished operation, handed back to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: OperationId,
    pub label: String,
    pub follow_up: Option<FollowUp>,
    pub error_message: String,
    pub state: OperationState,
    pub outcome: OperationOutcome,
    /// This was the last outstanding operation of its chain
    pub chain_finished: bool,
}

/// Spawns operation workers and tracks them until completion
pub struct OperationRunner {
    backend: Arc<dyn FlasherBackend>,
    policy: RetryPolicy,
    tx: mpsc::UnboundedSender<AppEvent>,
    next_chain: ChainId,
    chains: HashMap<ChainId, usize>,
    in_flight: HashMap<OperationId, InFlight>,
}

impl OperationRunner {
    pub fn new(
        backend: Arc<dyn FlasherBackend>,
        policy: RetryPolicy,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            backend,
            policy,
            tx,
            next_chain: 1,
            chains: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// At least one chain has operations that have not reached a terminal state
    pub fn is_busy(&self) -> bool {
        !self.chains.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn state(&self, id: OperationId) -> Option<OperationState> {
        self.in_flight.get(&id).map(|op| op.state)
    }

    /// Start every operation of the chain at once. Empty chains are ignored.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, chain: Vec<Operation>) -> Option<ChainId> {
        if chain.is_empty() {
            return None;
        }

        let chain_id = self.next_chain;
        self.next_chain += 1;
        self.chains.insert(chain_id, chain.len());
        log::info!(
            "Submitting chain #{} with {} operation(s) via {}",
            chain_id,
            chain.len(),
            self.backend.describe()
        );

        for (index, operation) in chain.into_iter().enumerate() {
            let id = OperationId {
                chain: chain_id,
                index,
            };
            let label = operation.label();
            self.in_flight.insert(
                id,
                InFlight {
                    label: label.clone(),
                    follow_up: operation.follow_up,
                    error_message: operation.error_message,
                    state: OperationState::Pending,
                },
            );

            tokio::spawn(run_operation(
                self.backend.clone(),
                self.policy,
                self.tx.clone(),
                id,
                label,
                operation.args,
            ));
        }

        Some(chain_id)
    }

    /// Record a progress event from a worker
    pub fn observe(&mut self, event: &AppEvent) {
        match event {
            AppEvent::OperationStarted(id, _) => self.set_state(*id, OperationState::Running),
            AppEvent::OperationAttemptFailed { id, .. } => {
                self.set_state(*id, OperationState::FailedRetryable)
            }
            AppEvent::OperationFinished(..) => {}
        }
    }

    fn set_state(&mut self, id: OperationId, state: OperationState) {
        if let Some(op) = self.in_flight.get_mut(&id) {
            op.state = state;
        }
    }

    /// Retire a finished operation. Unknown ids yield `None`.
    pub fn complete(&mut self, id: OperationId, outcome: OperationOutcome) -> Option<Completion> {
        let op = self.in_flight.remove(&id)?;

        let chain_finished = match self.chains.get_mut(&id.chain) {
            Some(remaining) if *remaining > 1 => {
                *remaining -= 1;
                false
            }
            Some(_) => {
                self.chains.remove(&id.chain);
                log::debug!("Chain #{} finished", id.chain);
                true
            }
            None => false,
        };

        let state = if outcome.is_success() {
            OperationState::Succeeded
        } else {
            OperationState::FailedTerminal
        };

        Some(Completion {
            id,
            label: op.label,
            follow_up: op.follow_up,
            error_message: op.error_message,
            state,
            outcome,
            chain_finished,
        })
    }
}

/// Worker body: settle, invoke, retry on non-zero exit up to the bound.
async fn run_operation(
    backend: Arc<dyn FlasherBackend>,
    policy: RetryPolicy,
    tx: mpsc::UnboundedSender<AppEvent>,
    id: OperationId,
    label: String,
    args: Vec<String>,
) {
    let _ = tx.send(AppEvent::OperationStarted(id, label.clone()));

    let mut attempt = 0;
    let outcome = loop {
        attempt += 1;
        if !policy.settle_delay.is_zero() {
            tokio::time::sleep(policy.settle_delay).await;
        }

        match backend.invoke(&args).await {
            Ok(output) if output.success() => {
                break OperationOutcome::Succeeded {
                    stdout: output.stdout,
                    attempts: attempt,
                };
            }
            Ok(output) => {
                log::warn!(
                    "{} {} attempt {}/{} exited with {:?}",
                    label,
                    id,
                    attempt,
                    policy.max_attempts,
                    output.exit_code
                );
                if attempt >= policy.max_attempts {
                    break OperationOutcome::Failed {
                        attempts: attempt,
                        cause: FailureCause::ExitStatus {
                            code: output.exit_code,
                            stderr: output.stderr,
                        },
                    };
                }
                let _ = tx.send(AppEvent::OperationAttemptFailed {
                    id,
                    attempt,
                    exit_code: output.exit_code,
                });
            }
            // Retrying cannot make a missing executable appear
            Err(e) => {
                log::error!("{} {} could not start the flasher: {}", label, id, e);
                break OperationOutcome::Failed {
                    attempts: attempt,
                    cause: FailureCause::Launch(e.to_string()),
                };
            }
        }
    };

    if tx.send(AppEvent::OperationFinished(id, outcome)).is_err() {
        log::warn!("Coordinator gone before {} {} reported back", label, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{EmsError, Result};
    use crate::models::BankId;
    use crate::services::flasher::ToolOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that fails a fixed number of times before succeeding
    struct FlakyBackend {
        failures: u32,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl FlasherBackend for FlakyBackend {
        async fn invoke(&self, _args: &[String]) -> Result<ToolOutput> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            let exit_code = if *calls > self.failures { 0 } else { 1 };
            Ok(ToolOutput {
                exit_code: Some(exit_code),
                stdout: format!("call {}", *calls),
                stderr: String::new(),
            })
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    struct MissingBackend;

    #[async_trait]
    impl FlasherBackend for MissingBackend {
        async fn invoke(&self, _args: &[String]) -> Result<ToolOutput> {
            Err(EmsError::ToolUnavailable("not installed".to_string()))
        }

        fn describe(&self) -> String {
            "missing".to_string()
        }
    }

    async fn finish_one(
        runner: &mut OperationRunner,
        rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    ) -> (Vec<OperationState>, Completion) {
        let mut seen = Vec::new();
        loop {
            let event = rx.recv().await.expect("worker dropped the channel");
            runner.observe(&event);
            match event {
                AppEvent::OperationFinished(id, outcome) => {
                    return (seen, runner.complete(id, outcome).unwrap());
                }
                AppEvent::OperationStarted(id, _) | AppEvent::OperationAttemptFailed { id, .. } => {
                    seen.push(runner.state(id).unwrap());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend = Arc::new(FlakyBackend {
            failures: 2,
            calls: Mutex::new(0),
        });
        let mut runner = OperationRunner::new(backend, RetryPolicy::immediate(3), tx);

        runner.submit(vec![Operation::scan(BankId::One)]).unwrap();
        assert!(runner.is_busy());

        let (states, completion) = finish_one(&mut runner, &mut rx).await;
        assert_eq!(
            states,
            vec![
                OperationState::Running,
                OperationState::FailedRetryable,
                OperationState::FailedRetryable
            ]
        );
        assert_eq!(completion.state, OperationState::Succeeded);
        assert_eq!(
            completion.outcome,
            OperationOutcome::Succeeded {
                stdout: "call 3".to_string(),
                attempts: 3
            }
        );
        assert_eq!(completion.follow_up, Some(FollowUp::ApplyScan(BankId::One)));
        assert!(completion.chain_finished);
        assert!(!runner.is_busy());
    }

    #[tokio::test]
    async fn test_launch_failure_is_not_retried() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut runner = OperationRunner::new(Arc::new(MissingBackend), RetryPolicy::immediate(3), tx);

        runner.submit(vec![Operation::format(BankId::Two)]).unwrap();
        let (_, completion) = finish_one(&mut runner, &mut rx).await;

        assert_eq!(completion.state, OperationState::FailedTerminal);
        assert_eq!(completion.outcome.attempts(), 1);
        assert!(matches!(
            completion.outcome,
            OperationOutcome::Failed {
                cause: FailureCause::Launch(_),
                ..
            }
        ));
    }

    /// Backend that records when it was invoked, on the tokio clock
    struct TimedBackend {
        failures: u32,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait]
    impl FlasherBackend for TimedBackend {
        async fn invoke(&self, _args: &[String]) -> Result<ToolOutput> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(tokio::time::Instant::now());
            let exit_code = if calls.len() as u32 > self.failures { 0 } else { 1 };
            Ok(ToolOutput {
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr: String::new(),
            })
        }

        fn describe(&self) -> String {
            "timed".to_string()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_precedes_every_attempt() {
        let settle = Duration::from_millis(500);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend = Arc::new(TimedBackend {
            failures: 2,
            calls: Mutex::new(Vec::new()),
        });
        let policy = RetryPolicy {
            max_attempts: 3,
            settle_delay: settle,
        };
        let mut runner = OperationRunner::new(backend.clone(), policy, tx);

        let start = tokio::time::Instant::now();
        runner.submit(vec![Operation::delete(BankId::One, &["0".to_string()])]).unwrap();
        let (_, completion) = finish_one(&mut runner, &mut rx).await;

        assert_eq!(completion.state, OperationState::Succeeded);
        assert_eq!(completion.outcome.attempts(), 3);
        assert!(start.elapsed() >= settle * 3);

        let calls = backend.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert!(calls[0] - start >= settle);
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= settle);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_untouched_until_settle_delay_passes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend = Arc::new(TimedBackend {
            failures: 0,
            calls: Mutex::new(Vec::new()),
        });
        let policy = RetryPolicy {
            max_attempts: 3,
            settle_delay: Duration::from_millis(500),
        };
        let mut runner = OperationRunner::new(backend.clone(), policy, tx);

        runner.submit(vec![Operation::scan(BankId::Two)]).unwrap();
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(backend.calls.lock().unwrap().is_empty());

        let (_, completion) = finish_one(&mut runner, &mut rx).await;
        assert_eq!(completion.outcome.attempts(), 1);
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_chain_is_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut runner = OperationRunner::new(Arc::new(MissingBackend), RetryPolicy::default(), tx);
        assert_eq!(runner.submit(Vec::new()), None);
        assert!(!runner.is_busy());
    }

    #[test]
    fn test_policy_from_config_never_allows_zero_attempts() {
        let config = FlasherConfig {
            max_attempts: 0,
            settle_delay_ms: 250,
            ..FlasherConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.settle_delay, Duration::from_millis(250));
    }
}
