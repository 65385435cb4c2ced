pub mod persistence;
pub mod registry;

pub use persistence::{load_registry, save_registry, SCENARIO_STORE_KEY};
pub use registry::{RegistrySnapshot, ScenarioRegistry};
