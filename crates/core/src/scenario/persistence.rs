use crate::scenario::registry::{RegistrySnapshot, ScenarioRegistry};
use crate::store::{PersistentStore, StoreError};

pub const SCENARIO_STORE_KEY: &str = "footprint.scenarios";

/// Loads the registry saved under [`SCENARIO_STORE_KEY`]; an absent key
/// yields an empty registry.
pub async fn load_registry(store: &dyn PersistentStore) -> Result<ScenarioRegistry, StoreError> {
    let Some(value) = store.get(SCENARIO_STORE_KEY).await? else {
        return Ok(ScenarioRegistry::new());
    };

    let snapshot = serde_json::from_value::<RegistrySnapshot>(value).map_err(|error| {
        StoreError::Decode { key: SCENARIO_STORE_KEY.to_string(), message: error.to_string() }
    })?;
    Ok(ScenarioRegistry::from_snapshot(snapshot))
}

pub async fn save_registry(
    store: &dyn PersistentStore,
    registry: &ScenarioRegistry,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(registry.snapshot()).map_err(|error| StoreError::Decode {
        key: SCENARIO_STORE_KEY.to_string(),
        message: error.to_string(),
    })?;
    store.set(SCENARIO_STORE_KEY, value).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{load_registry, save_registry, SCENARIO_STORE_KEY};
    use crate::domain::product::{BomEntry, ProductId};
    use crate::domain::scenario::{ScenarioPatch, ScenarioResults};
    use crate::scenario::ScenarioRegistry;
    use crate::store::{InMemoryStore, PersistentStore, StoreError};

    #[tokio::test]
    async fn registry_survives_a_store_round_trip() {
        let store = InMemoryStore::default();
        let mut registry = ScenarioRegistry::new();
        let baseline = registry.create_scenario("Baseline", ProductId("p1".to_string()), None);
        registry.update_scenario(
            &baseline,
            ScenarioPatch {
                bom_entries: Some(vec![BomEntry::new("l1", "Frame", 4.0, "kg")]),
                results: Some(Some(ScenarioResults { total_emissions: 18.5, breakdown: None })),
                ..ScenarioPatch::default()
            },
        );
        let alt = registry.clone_scenario(&baseline, "Lighter frame");
        registry.add_to_comparison(&alt);

        save_registry(&store, &registry).await.expect("save");
        let loaded = load_registry(&store).await.expect("load");

        assert_eq!(loaded, registry);
    }

    #[tokio::test]
    async fn missing_key_loads_empty_registry() {
        let loaded = load_registry(&InMemoryStore::default()).await.expect("load");
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn malformed_blob_is_a_decode_error() {
        let store = InMemoryStore::default();
        store.set(SCENARIO_STORE_KEY, json!({"scenarios": "not a list"})).await.expect("seed");

        let error = load_registry(&store).await.expect_err("decode should fail");
        assert!(matches!(error, StoreError::Decode { ref key, .. } if key == SCENARIO_STORE_KEY));
    }
}
