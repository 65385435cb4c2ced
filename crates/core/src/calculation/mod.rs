pub mod client;
pub mod deterministic;
pub mod lifecycle;

pub use client::{
    CalculationServiceClient, ServiceError, StatusReport, SubmitCalculation, SubmitReceipt,
};
pub use deterministic::{DeterministicCalculationService, EmissionFactor};
pub use lifecycle::{
    CalculationFailure, CalculationLifecycle, LifecycleSnapshot, PollingConfig, StartOutcome,
};
