use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::{BomEntry, ProductId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioId(pub String);

impl ScenarioId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The sentinel returned when a clone source does not exist.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    #[default]
    Grid,
    Renewable,
    Mixed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub transport_distance: f64,
    pub energy_source: EnergySource,
    pub production_volume: u32,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self { transport_distance: 0.0, energy_source: EnergySource::Grid, production_volume: 1 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResults {
    pub total_emissions: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<BTreeMap<String, f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub product_id: ProductId,
    pub bom_entries: Vec<BomEntry>,
    pub parameters: ScenarioParameters,
    pub results: Option<ScenarioResults>,
    pub created_at: DateTime<Utc>,
    pub is_baseline: bool,
}

/// Partial update applied by `ScenarioRegistry::update_scenario`.
///
/// `results: Some(None)` clears stored results. Baseline designation is not
/// patchable; use `set_as_baseline`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioPatch {
    pub name: Option<String>,
    pub product_id: Option<ProductId>,
    pub bom_entries: Option<Vec<BomEntry>>,
    pub parameters: Option<ScenarioParameters>,
    pub results: Option<Option<ScenarioResults>>,
}

impl ScenarioPatch {
    pub fn with_results(results: ScenarioResults) -> Self {
        Self { results: Some(Some(results)), ..Self::default() }
    }

    pub fn renamed(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub(crate) fn apply_to(self, scenario: &mut Scenario) {
        if let Some(name) = self.name {
            scenario.name = name;
        }
        if let Some(product_id) = self.product_id {
            scenario.product_id = product_id;
        }
        if let Some(bom_entries) = self.bom_entries {
            scenario.bom_entries = bom_entries;
        }
        if let Some(parameters) = self.parameters {
            scenario.parameters = parameters;
        }
        if let Some(results) = self.results {
            scenario.results = results;
        }
    }
}
