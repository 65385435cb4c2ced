pub mod calculation;
pub mod comparison;
pub mod config;
pub mod delta;
pub mod diagnostics;
pub mod domain;
pub mod errors;
pub mod scenario;
pub mod store;
pub mod wizard;

pub use calculation::{
    CalculationFailure, CalculationLifecycle, CalculationServiceClient,
    DeterministicCalculationService, EmissionFactor, LifecycleSnapshot, PollingConfig,
    ServiceError, StartOutcome, StatusReport, SubmitCalculation, SubmitReceipt,
};
pub use comparison::{build_comparison, ComparisonReport};
pub use config::{ConfigError, ConfigOverrides, FootprintConfig, LoadOptions, LogFormat};
pub use delta::{
    calculate_breakdown_deltas, calculate_delta, calculate_deltas, CategoryDelta, DeltaDirection,
    DeltaResult, ScenarioEmissions,
};
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSink, InMemoryDiagnosticSink, TracingDiagnosticSink,
};
pub use domain::calculation::{
    CalculationId, CalculationRecord, CalculationStatus, EmissionTotals,
};
pub use domain::product::{BomEntry, ProductId};
pub use domain::scenario::{
    EnergySource, Scenario, ScenarioId, ScenarioParameters, ScenarioPatch, ScenarioResults,
};
pub use domain::wizard::{PersistedWizardState, ProceedRule, WizardState, WizardStep};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use scenario::{load_registry, save_registry, RegistrySnapshot, ScenarioRegistry};
pub use store::{InMemoryStore, PersistentStore, StoreError};
pub use wizard::{WizardAction, WizardController};
