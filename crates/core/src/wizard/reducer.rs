//! Pure transition functions over the durable wizard state.
//!
//! Every function takes the current state by reference and returns the next
//! state together with a description of what changed. Nothing here performs
//! I/O; persistence and diagnostics belong to the controller.

use serde::{Deserialize, Serialize};

use crate::domain::wizard::{PersistedWizardState, WizardStep};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardAction {
    SetStep(WizardStep),
    GoNext,
    GoBack,
    MarkComplete(WizardStep),
    MarkIncomplete(WizardStep),
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepChange {
    Moved { from: WizardStep, to: WizardStep },
    Updated,
    Unchanged,
    Rejected { target: WizardStep, missing: Vec<WizardStep> },
}

impl StepChange {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reduction {
    pub state: PersistedWizardState,
    pub change: StepChange,
}

impl Reduction {
    fn unchanged(state: &PersistedWizardState) -> Self {
        Self { state: state.clone(), change: StepChange::Unchanged }
    }
}

pub fn reduce(state: &PersistedWizardState, action: WizardAction) -> Reduction {
    match action {
        WizardAction::SetStep(target) => set_step(state, target),
        WizardAction::GoNext => match state.current_step.next() {
            Some(next) => set_step(state, next),
            None => Reduction::unchanged(state),
        },
        WizardAction::GoBack => match state.current_step.previous() {
            Some(previous) => set_step(state, previous),
            None => Reduction::unchanged(state),
        },
        WizardAction::MarkComplete(step) => mark_complete(state, step),
        WizardAction::MarkIncomplete(step) => mark_incomplete(state, step),
        WizardAction::Reset => reset(state),
    }
}

/// Steps that must be completed before `target` can be entered from `state`.
/// Empty when the move is allowed.
pub fn missing_for(state: &PersistedWizardState, target: WizardStep) -> Vec<WizardStep> {
    if target <= state.current_step {
        return Vec::new();
    }

    target
        .predecessors()
        .iter()
        .copied()
        .filter(|step| !state.completed_steps.contains(step))
        .collect()
}

pub fn set_step(state: &PersistedWizardState, target: WizardStep) -> Reduction {
    if target == state.current_step {
        return Reduction::unchanged(state);
    }

    let missing = missing_for(state, target);
    if !missing.is_empty() {
        return Reduction {
            state: state.clone(),
            change: StepChange::Rejected { target, missing },
        };
    }

    let mut next = state.clone();
    next.current_step = target;
    Reduction { state: next, change: StepChange::Moved { from: state.current_step, to: target } }
}

pub fn mark_complete(state: &PersistedWizardState, step: WizardStep) -> Reduction {
    if state.completed_steps.contains(&step) {
        return Reduction::unchanged(state);
    }

    let mut next = state.clone();
    next.completed_steps.insert(step);
    Reduction { state: next, change: StepChange::Updated }
}

pub fn mark_incomplete(state: &PersistedWizardState, step: WizardStep) -> Reduction {
    if !state.completed_steps.contains(&step) {
        return Reduction::unchanged(state);
    }

    let mut next = state.clone();
    next.completed_steps.remove(&step);
    Reduction { state: next, change: StepChange::Updated }
}

pub fn reset(state: &PersistedWizardState) -> Reduction {
    let initial = PersistedWizardState::default();
    if *state == initial {
        return Reduction::unchanged(state);
    }
    Reduction { state: initial, change: StepChange::Updated }
}
