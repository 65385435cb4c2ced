use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Select,
    Edit,
    Calculate,
    Results,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] =
        [WizardStep::Select, WizardStep::Edit, WizardStep::Calculate, WizardStep::Results];

    pub fn index(self) -> usize {
        match self {
            Self::Select => 0,
            Self::Edit => 1,
            Self::Calculate => 2,
            Self::Results => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    /// Steps strictly before `self`, in sequence order.
    pub fn predecessors(self) -> &'static [WizardStep] {
        &Self::ALL[..self.index()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Edit => "edit",
            Self::Calculate => "calculate",
            Self::Results => "results",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "select" => Some(Self::Select),
            "edit" => Some(Self::Edit),
            "calculate" => Some(Self::Calculate),
            "results" => Some(Self::Results),
            _ => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `can_proceed` is derived from the durable wizard state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProceedRule {
    /// Proceeding requires the current step to be complete.
    #[default]
    Strict,
    /// Proceeding is also allowed from any step that is not the last one,
    /// once the wizard has any progress. The initial state never proceeds.
    Permissive,
}

impl std::str::FromStr for ProceedRule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("unsupported proceed rule `{other}` (expected strict|permissive)")),
        }
    }
}

/// The durable part of the wizard. Derived flags are never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedWizardState {
    pub current_step: WizardStep,
    pub completed_steps: BTreeSet<WizardStep>,
}

impl Default for PersistedWizardState {
    fn default() -> Self {
        Self { current_step: WizardStep::Select, completed_steps: BTreeSet::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub completed_steps: BTreeSet<WizardStep>,
    pub can_proceed: bool,
    pub can_go_back: bool,
}

impl WizardState {
    pub fn derive(persisted: &PersistedWizardState, rule: ProceedRule) -> Self {
        let current = persisted.current_step;
        let current_complete = persisted.completed_steps.contains(&current);
        let can_proceed = match rule {
            ProceedRule::Strict => current_complete,
            ProceedRule::Permissive => {
                current_complete
                    || (!current.is_last() && !persisted.completed_steps.is_empty())
            }
        };

        Self {
            current_step: current,
            completed_steps: persisted.completed_steps.clone(),
            can_proceed,
            can_go_back: current.index() > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{PersistedWizardState, ProceedRule, WizardState, WizardStep};

    #[test]
    fn steps_are_ordered_and_navigable() {
        assert!(WizardStep::Select < WizardStep::Edit);
        assert!(WizardStep::Calculate < WizardStep::Results);
        assert_eq!(WizardStep::Select.previous(), None);
        assert_eq!(WizardStep::Results.next(), None);
        assert_eq!(WizardStep::Edit.next(), Some(WizardStep::Calculate));
        assert_eq!(
            WizardStep::Calculate.predecessors(),
            &[WizardStep::Select, WizardStep::Edit]
        );
    }

    #[test]
    fn persisted_state_serializes_only_durable_fields() {
        let persisted = PersistedWizardState {
            current_step: WizardStep::Edit,
            completed_steps: BTreeSet::from([WizardStep::Select]),
        };

        let json = serde_json::to_value(&persisted).expect("serialize");
        assert_eq!(json, serde_json::json!({"currentStep": "edit", "completedSteps": ["select"]}));
    }

    #[test]
    fn initial_state_never_proceeds() {
        let persisted = PersistedWizardState::default();
        let strict = WizardState::derive(&persisted, ProceedRule::Strict);
        let permissive = WizardState::derive(&persisted, ProceedRule::Permissive);

        assert!(!strict.can_proceed);
        assert!(!permissive.can_proceed);
        assert!(!strict.can_go_back);
    }

    #[test]
    fn permissive_rule_allows_incomplete_middle_step_after_progress() {
        let persisted = PersistedWizardState {
            current_step: WizardStep::Edit,
            completed_steps: BTreeSet::from([WizardStep::Select]),
        };

        assert!(WizardState::derive(&persisted, ProceedRule::Permissive).can_proceed);
        assert!(!WizardState::derive(&persisted, ProceedRule::Strict).can_proceed);
    }

    #[test]
    fn completing_another_step_does_not_unlock_strict_proceed() {
        let persisted = PersistedWizardState {
            current_step: WizardStep::Select,
            completed_steps: BTreeSet::from([WizardStep::Edit]),
        };

        assert!(!WizardState::derive(&persisted, ProceedRule::Strict).can_proceed);
    }

    #[test]
    fn permissive_rule_blocks_incomplete_last_step() {
        let persisted = PersistedWizardState {
            current_step: WizardStep::Results,
            completed_steps: BTreeSet::new(),
        };

        let state = WizardState::derive(&persisted, ProceedRule::Permissive);
        assert!(!state.can_proceed);
        assert!(state.can_go_back);
    }
}
