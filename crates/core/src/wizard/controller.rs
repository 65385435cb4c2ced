use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSink, TracingDiagnosticSink};
use crate::domain::wizard::{PersistedWizardState, ProceedRule, WizardState, WizardStep};
use crate::store::PersistentStore;
use crate::wizard::reducer::{self, StepChange, WizardAction};

/// Key under which the durable wizard state is stored.
pub const WIZARD_STORE_KEY: &str = "footprint.wizard";

/// Step sequencer for the select → edit → calculate → results flow.
///
/// Rejected moves are ignored and reported through the diagnostic sink; they
/// never surface as errors. Each accepted change is written to the store
/// before the lock is released, so stored snapshots follow transition order.
pub struct WizardController {
    state: Mutex<PersistedWizardState>,
    rule: ProceedRule,
    store: Arc<dyn PersistentStore>,
    diagnostics: Arc<dyn DiagnosticSink>,
    session_id: String,
}

impl WizardController {
    pub fn new(store: Arc<dyn PersistentStore>, rule: ProceedRule) -> Self {
        Self::with_state(PersistedWizardState::default(), store, rule)
    }

    fn with_state(
        state: PersistedWizardState,
        store: Arc<dyn PersistentStore>,
        rule: ProceedRule,
    ) -> Self {
        Self {
            state: Mutex::new(state),
            rule,
            store,
            diagnostics: Arc::new(TracingDiagnosticSink),
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Rebuilds the controller from the store. Missing or unreadable state
    /// falls back to the initial step.
    pub async fn restore(store: Arc<dyn PersistentStore>, rule: ProceedRule) -> Self {
        let persisted = match store.get(WIZARD_STORE_KEY).await {
            Ok(Some(value)) => match serde_json::from_value::<PersistedWizardState>(value) {
                Ok(persisted) => persisted,
                Err(error) => {
                    warn!(
                        event_name = "wizard.restore_decode_failed",
                        error = %error,
                        "stored wizard state is unreadable; starting from the first step"
                    );
                    PersistedWizardState::default()
                }
            },
            Ok(None) => PersistedWizardState::default(),
            Err(error) => {
                warn!(
                    event_name = "wizard.restore_failed",
                    error = %error,
                    "wizard state could not be loaded; starting from the first step"
                );
                PersistedWizardState::default()
            }
        };

        Self::with_state(persisted, store, rule)
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub async fn snapshot(&self) -> WizardState {
        let state = self.state.lock().await;
        WizardState::derive(&state, self.rule)
    }

    pub async fn current_step(&self) -> WizardStep {
        self.state.lock().await.current_step
    }

    pub async fn set_step(&self, target: WizardStep) -> StepChange {
        self.dispatch(WizardAction::SetStep(target)).await
    }

    pub async fn go_next(&self) -> StepChange {
        self.dispatch(WizardAction::GoNext).await
    }

    pub async fn go_back(&self) -> StepChange {
        self.dispatch(WizardAction::GoBack).await
    }

    pub async fn mark_step_complete(&self, step: WizardStep) -> StepChange {
        self.dispatch(WizardAction::MarkComplete(step)).await
    }

    pub async fn mark_step_incomplete(&self, step: WizardStep) -> StepChange {
        self.dispatch(WizardAction::MarkIncomplete(step)).await
    }

    pub async fn reset(&self) -> StepChange {
        self.dispatch(WizardAction::Reset).await
    }

    async fn dispatch(&self, action: WizardAction) -> StepChange {
        let mut state = self.state.lock().await;
        let reduction = reducer::reduce(&state, action);

        if let StepChange::Rejected { target, missing } = &reduction.change {
            self.report_rejection(state.current_step, *target, missing);
            return reduction.change;
        }

        if reduction.state == *state {
            return reduction.change;
        }

        *state = reduction.state;
        debug!(
            event_name = "wizard.transition_applied",
            correlation_id = %self.session_id,
            action = ?action,
            current_step = %state.current_step,
            "wizard state updated"
        );
        self.persist(&state).await;
        reduction.change
    }

    fn report_rejection(&self, from: WizardStep, target: WizardStep, missing: &[WizardStep]) {
        let missing = missing.iter().map(|step| step.as_str()).collect::<Vec<_>>().join(",");
        self.diagnostics.emit(
            Diagnostic::new(
                self.session_id.clone(),
                "wizard.step_rejected",
                DiagnosticCategory::Wizard,
                format!("cannot move to `{target}` before completing earlier steps"),
            )
            .with_metadata("from", from.as_str())
            .with_metadata("to", target.as_str())
            .with_metadata("missing", missing),
        );
    }

    async fn persist(&self, state: &PersistedWizardState) {
        let value = match serde_json::to_value(state) {
            Ok(value) => value,
            Err(error) => {
                warn!(event_name = "wizard.persist_encode_failed", error = %error, "wizard state not saved");
                return;
            }
        };

        if let Err(error) = self.store.set(WIZARD_STORE_KEY, value).await {
            self.diagnostics.emit(
                Diagnostic::new(
                    self.session_id.clone(),
                    "wizard.persist_failed",
                    DiagnosticCategory::Persistence,
                    "wizard state not saved",
                )
                .with_metadata("key", WIZARD_STORE_KEY)
                .with_metadata("error", error.to_string()),
            );
        }
    }
}
