use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::calculation::{CalculationId, CalculationStatus, EmissionTotals};
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCalculation {
    pub product_id: ProductId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub calculation_id: CalculationId,
    pub status: CalculationStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: CalculationStatus,
    #[serde(flatten)]
    pub totals: EmissionTotals,
    pub breakdown: Option<BTreeMap<String, f64>>,
    pub error_message: Option<String>,
}

impl StatusReport {
    pub fn with_status(status: CalculationStatus) -> Self {
        Self { status, totals: EmissionTotals::default(), breakdown: None, error_message: None }
    }

    pub fn completed(total: f64) -> Self {
        Self {
            totals: EmissionTotals { total: Some(total), ..EmissionTotals::default() },
            ..Self::with_status(CalculationStatus::Completed)
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::with_status(CalculationStatus::Failed)
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced a response (connection reset, timeout, ...).
    #[error("calculation service unreachable: {0}")]
    Transport(String),
    /// The service answered and refused the request.
    #[error("calculation service rejected the request: {0}")]
    Rejected(String),
}

/// Remote calculation service. `submit` is called once per calculation and
/// never retried; `get_status` is polled until a terminal status.
#[async_trait]
pub trait CalculationServiceClient: Send + Sync {
    async fn submit(&self, request: &SubmitCalculation) -> Result<SubmitReceipt, ServiceError>;
    async fn get_status(&self, calculation_id: &CalculationId)
        -> Result<StatusReport, ServiceError>;
}
