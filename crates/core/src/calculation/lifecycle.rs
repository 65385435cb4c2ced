//! Submit/poll lifecycle for a single carbon-footprint calculation.
//!
//! A lifecycle owns at most one polling session at a time. Every session is
//! tagged with a generation number; cancelling bumps the generation, so any
//! response that belongs to an older session is dropped instead of applied.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::calculation::client::{CalculationServiceClient, StatusReport, SubmitCalculation};
use crate::domain::calculation::{CalculationId, CalculationRecord, CalculationStatus};
use crate::domain::product::{BomEntry, ProductId};
use crate::domain::wizard::WizardStep;
use crate::wizard::WizardController;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval: Duration::from_millis(2_000), max_attempts: 30 }
    }
}

/// User-facing calculation failures. These are attached to the lifecycle
/// state rather than returned, so callers read them from `snapshot()`.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CalculationFailure {
    #[error("calculation could not be submitted: {0}")]
    Submission(String),
    #[error("{0}")]
    Rejected(String),
    #[error("calculation timeout: no result after {attempts} status checks")]
    TimedOut { attempts: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// No product selected or the BOM is empty.
    Skipped,
    Submitted(CalculationId),
    SubmitFailed,
    /// The lifecycle was stopped or restarted while the submit was in flight.
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LifecycleSnapshot {
    pub is_calculating: bool,
    pub error: Option<CalculationFailure>,
    pub elapsed_seconds: u64,
    pub attempts: u32,
    pub record: Option<CalculationRecord>,
}

impl LifecycleSnapshot {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

#[derive(Default)]
struct LifecycleState {
    generation: u64,
    is_calculating: bool,
    error: Option<CalculationFailure>,
    elapsed_seconds: u64,
    attempts: u32,
    started_at: Option<Instant>,
    record: Option<CalculationRecord>,
    poller: Option<JoinHandle<()>>,
}

impl LifecycleState {
    /// Invalidates the current session and aborts its scheduled task.
    fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.halt();
    }

    /// Stops calculating without touching the generation. Used from inside
    /// the poll task when it reaches a terminal state.
    fn halt(&mut self) {
        self.is_calculating = false;
        self.elapsed_seconds = 0;
        self.started_at = None;
        self.poller = None;
    }

    fn refresh_elapsed(&mut self) {
        if let Some(started_at) = self.started_at {
            self.elapsed_seconds = started_at.elapsed().as_secs();
        }
    }

    fn apply_report(&mut self, report: &StatusReport) {
        if let Some(record) = self.record.as_mut() {
            record.status = report.status;
            record.totals = record.totals.merged_with(&report.totals);
            if let Some(breakdown) = &report.breakdown {
                record.breakdown = Some(breakdown.clone());
            }
            if let Some(message) = &report.error_message {
                record.error_message = Some(message.clone());
            }
            record.updated_at = Utc::now();
        }
    }
}

enum PollStep {
    Continue,
    Finished,
}

struct Shared {
    client: Arc<dyn CalculationServiceClient>,
    wizard: Arc<WizardController>,
    config: PollingConfig,
    state: Mutex<LifecycleState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn poll_once(&self, generation: u64, calculation_id: &CalculationId) -> PollStep {
        {
            let mut state = self.lock();
            if state.generation != generation {
                return PollStep::Finished;
            }
            state.refresh_elapsed();

            if state.attempts >= self.config.max_attempts {
                let attempts = state.attempts;
                state.error = Some(CalculationFailure::TimedOut { attempts });
                state.halt();
                warn!(
                    event_name = "calculation.timed_out",
                    calculation_id = %calculation_id,
                    attempts,
                    "calculation did not reach a terminal status"
                );
                return PollStep::Finished;
            }
            state.attempts += 1;
        }

        let response = self.client.get_status(calculation_id).await;

        {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(
                    event_name = "calculation.stale_response_dropped",
                    calculation_id = %calculation_id,
                    generation,
                    "dropping status response from a cancelled session"
                );
                return PollStep::Finished;
            }

            let report = match response {
                Ok(report) => report,
                Err(error) => {
                    warn!(
                        event_name = "calculation.poll_transient_failure",
                        calculation_id = %calculation_id,
                        attempt = state.attempts,
                        error = %error,
                        "status check failed; polling continues"
                    );
                    return PollStep::Continue;
                }
            };

            state.apply_report(&report);
            match report.status {
                CalculationStatus::Pending | CalculationStatus::InProgress => {
                    debug!(
                        event_name = "calculation.poll_progress",
                        calculation_id = %calculation_id,
                        attempt = state.attempts,
                        status = report.status.as_str(),
                        "calculation still running"
                    );
                    return PollStep::Continue;
                }
                CalculationStatus::Failed => {
                    let message = report
                        .error_message
                        .unwrap_or_else(|| "calculation failed".to_string());
                    warn!(
                        event_name = "calculation.failed",
                        calculation_id = %calculation_id,
                        error = %message,
                        "calculation service reported failure"
                    );
                    state.error = Some(CalculationFailure::Rejected(message));
                    state.halt();
                    return PollStep::Finished;
                }
                CalculationStatus::Completed => {
                    info!(
                        event_name = "calculation.completed",
                        calculation_id = %calculation_id,
                        attempts = state.attempts,
                        total = ?report.totals.total,
                        "calculation completed"
                    );
                    // Completion is committed here; a later stop_polling no
                    // longer holds back the wizard advance below.
                    state.halt();
                }
            }
        }

        self.wizard.mark_step_complete(WizardStep::Calculate).await;
        self.wizard.go_next().await;
        PollStep::Finished
    }
}

async fn poll_loop(shared: Arc<Shared>, generation: u64, calculation_id: CalculationId) {
    let period = shared.config.interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let PollStep::Finished = shared.poll_once(generation, &calculation_id).await {
            break;
        }
    }
}

/// Drives one calculation at a time from submission to a terminal state and
/// advances the wizard when it completes.
///
/// Dropping the handle stops any active polling session.
pub struct CalculationLifecycle {
    shared: Arc<Shared>,
}

impl CalculationLifecycle {
    /// A zero interval is raised to one millisecond.
    pub fn new(
        client: Arc<dyn CalculationServiceClient>,
        wizard: Arc<WizardController>,
        mut config: PollingConfig,
    ) -> Self {
        config.interval = config.interval.max(MIN_POLL_INTERVAL);
        Self {
            shared: Arc::new(Shared {
                client,
                wizard,
                config,
                state: Mutex::new(LifecycleState::default()),
            }),
        }
    }

    pub fn config(&self) -> &PollingConfig {
        &self.shared.config
    }

    pub async fn start_calculation(
        &self,
        product_id: Option<&ProductId>,
        bom: &[BomEntry],
    ) -> StartOutcome {
        let Some(product_id) = product_id else {
            debug!(event_name = "calculation.skipped", reason = "no_product", "nothing to calculate");
            return StartOutcome::Skipped;
        };
        if bom.is_empty() {
            debug!(event_name = "calculation.skipped", reason = "empty_bom", "nothing to calculate");
            return StartOutcome::Skipped;
        }

        let generation = {
            let mut state = self.shared.lock();
            state.cancel();
            state.error = None;
            state.attempts = 0;
            state.record = None;
            state.started_at = Some(Instant::now());
            state.generation
        };

        let request = SubmitCalculation { product_id: product_id.clone() };
        let submitted = self.shared.client.submit(&request).await;

        let mut state = self.shared.lock();
        if state.generation != generation {
            return StartOutcome::Cancelled;
        }

        match submitted {
            Ok(receipt) => {
                let calculation_id = receipt.calculation_id;
                info!(
                    event_name = "calculation.submitted",
                    calculation_id = %calculation_id,
                    product_id = %product_id,
                    generation,
                    "calculation submitted; polling for status"
                );
                state.record =
                    Some(CalculationRecord::pending(calculation_id.clone(), product_id.clone()));
                state.is_calculating = true;
                state.poller = Some(tokio::spawn(poll_loop(
                    self.shared.clone(),
                    generation,
                    calculation_id.clone(),
                )));
                StartOutcome::Submitted(calculation_id)
            }
            Err(error) => {
                warn!(
                    event_name = "calculation.submit_failed",
                    product_id = %product_id,
                    error = %error,
                    "calculation submission failed"
                );
                state.error = Some(CalculationFailure::Submission(error.to_string()));
                state.halt();
                StartOutcome::SubmitFailed
            }
        }
    }

    /// Cancels the active polling session, if any. Safe to call repeatedly.
    pub fn stop_polling(&self) {
        let mut state = self.shared.lock();
        let was_polling = state.poller.is_some();
        state.cancel();
        if was_polling {
            debug!(event_name = "calculation.polling_stopped", "polling cancelled");
        }
    }

    pub fn is_calculating(&self) -> bool {
        self.shared.lock().is_calculating
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        let state = self.shared.lock();
        LifecycleSnapshot {
            is_calculating: state.is_calculating,
            error: state.error.clone(),
            elapsed_seconds: state.elapsed_seconds,
            attempts: state.attempts,
            record: state.record.clone(),
        }
    }
}

impl Drop for CalculationLifecycle {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
