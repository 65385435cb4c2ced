use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::product::ProductId;
use crate::domain::scenario::{Scenario, ScenarioId, ScenarioParameters, ScenarioPatch};

/// Serializable form of the registry, used for persistence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub scenarios: Vec<Scenario>,
    pub active_scenario_id: Option<ScenarioId>,
    pub comparison_ids: Vec<ScenarioId>,
}

/// Owns saved scenarios, the active pointer, the comparison set and the
/// baseline designation.
///
/// Unknown ids are never errors: mutating operations become no-ops and
/// `clone_scenario` returns the empty sentinel id. Once any scenario exists,
/// exactly one of them is the baseline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioRegistry {
    scenarios: Vec<Scenario>,
    active_scenario_id: Option<ScenarioId>,
    comparison_ids: Vec<ScenarioId>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from a snapshot, repairing a missing or duplicated
    /// baseline and dropping ids that no longer resolve.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let mut registry = Self {
            scenarios: snapshot.scenarios,
            active_scenario_id: snapshot.active_scenario_id,
            comparison_ids: Vec::new(),
        };

        for id in snapshot.comparison_ids {
            registry.add_to_comparison(&id);
        }
        if let Some(active) = registry.active_scenario_id.clone() {
            if registry.position(&active).is_none() {
                registry.active_scenario_id = None;
            }
        }

        let baselines = registry.scenarios.iter().filter(|scenario| scenario.is_baseline).count();
        if baselines != 1 && !registry.scenarios.is_empty() {
            warn!(
                event_name = "scenario.baseline_repaired",
                baselines,
                "restored registry did not have exactly one baseline"
            );
            let keep = registry
                .scenarios
                .iter()
                .find(|scenario| scenario.is_baseline)
                .map(|scenario| scenario.id.clone())
                .unwrap_or_else(|| registry.scenarios[0].id.clone());
            registry.set_as_baseline(&keep);
        }

        registry
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            scenarios: self.scenarios.clone(),
            active_scenario_id: self.active_scenario_id.clone(),
            comparison_ids: self.comparison_ids.clone(),
        }
    }

    pub fn create_scenario(
        &mut self,
        name: impl Into<String>,
        product_id: ProductId,
        base_scenario_id: Option<&ScenarioId>,
    ) -> ScenarioId {
        let (bom_entries, parameters) = match base_scenario_id.and_then(|id| self.scenario(id)) {
            Some(base) => (base.bom_entries.clone(), base.parameters.clone()),
            None => (Vec::new(), ScenarioParameters::default()),
        };

        let scenario = Scenario {
            id: ScenarioId::generate(),
            name: name.into(),
            product_id,
            bom_entries,
            parameters,
            results: None,
            created_at: Utc::now(),
            is_baseline: self.scenarios.is_empty(),
        };
        self.insert_active(scenario)
    }

    /// Copies BOM and parameters of `id` into a new, non-baseline scenario
    /// without results. Returns `ScenarioId::empty()` if `id` is unknown.
    pub fn clone_scenario(&mut self, id: &ScenarioId, new_name: impl Into<String>) -> ScenarioId {
        let Some(source) = self.scenario(id) else {
            debug!(event_name = "scenario.clone_source_missing", scenario_id = %id, "nothing to clone");
            return ScenarioId::empty();
        };

        let scenario = Scenario {
            id: ScenarioId::generate(),
            name: new_name.into(),
            product_id: source.product_id.clone(),
            bom_entries: source.bom_entries.clone(),
            parameters: source.parameters.clone(),
            results: None,
            created_at: Utc::now(),
            is_baseline: false,
        };
        self.insert_active(scenario)
    }

    fn insert_active(&mut self, scenario: Scenario) -> ScenarioId {
        let id = scenario.id.clone();
        debug!(
            event_name = "scenario.created",
            scenario_id = %id,
            is_baseline = scenario.is_baseline,
            "scenario added to registry"
        );
        self.scenarios.push(scenario);
        self.active_scenario_id = Some(id.clone());
        id
    }

    pub fn update_scenario(&mut self, id: &ScenarioId, patch: ScenarioPatch) {
        if let Some(index) = self.position(id) {
            patch.apply_to(&mut self.scenarios[index]);
        }
    }

    pub fn delete_scenario(&mut self, id: &ScenarioId) {
        let Some(index) = self.position(id) else {
            return;
        };

        let removed = self.scenarios.remove(index);
        self.comparison_ids.retain(|candidate| candidate != id);
        if self.active_scenario_id.as_ref() == Some(id) {
            self.active_scenario_id = None;
        }

        if removed.is_baseline {
            if let Some(successor) = self.scenarios.first_mut() {
                successor.is_baseline = true;
                debug!(
                    event_name = "scenario.baseline_promoted",
                    scenario_id = %successor.id,
                    "baseline deleted; earliest remaining scenario promoted"
                );
            }
        }
    }

    pub fn set_active_scenario(&mut self, id: &ScenarioId) {
        if self.position(id).is_some() {
            self.active_scenario_id = Some(id.clone());
        }
    }

    pub fn add_to_comparison(&mut self, id: &ScenarioId) {
        if self.position(id).is_some() && !self.comparison_ids.contains(id) {
            self.comparison_ids.push(id.clone());
        }
    }

    pub fn remove_from_comparison(&mut self, id: &ScenarioId) {
        self.comparison_ids.retain(|candidate| candidate != id);
    }

    pub fn clear_comparison(&mut self) {
        self.comparison_ids.clear();
    }

    pub fn set_as_baseline(&mut self, id: &ScenarioId) {
        if self.position(id).is_none() {
            return;
        }
        for scenario in &mut self.scenarios {
            scenario.is_baseline = scenario.id == *id;
        }
    }

    pub fn scenario(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.id == *id)
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn active_scenario(&self) -> Option<&Scenario> {
        self.active_scenario_id.as_ref().and_then(|id| self.scenario(id))
    }

    pub fn active_scenario_id(&self) -> Option<&ScenarioId> {
        self.active_scenario_id.as_ref()
    }

    pub fn comparison_ids(&self) -> &[ScenarioId] {
        &self.comparison_ids
    }

    pub fn comparison_scenarios(&self) -> Vec<&Scenario> {
        self.comparison_ids.iter().filter_map(|id| self.scenario(id)).collect()
    }

    pub fn baseline(&self) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.is_baseline)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn position(&self, id: &ScenarioId) -> Option<usize> {
        self.scenarios.iter().position(|scenario| scenario.id == *id)
    }
}
