use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalculationId(pub String);

impl fmt::Display for CalculationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl CalculationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Aggregated CO2e totals reported by the calculation service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionTotals {
    pub total: Option<f64>,
    pub materials: Option<f64>,
    pub energy: Option<f64>,
    pub transport: Option<f64>,
}

impl EmissionTotals {
    /// Field-wise merge where `other` wins wherever it carries a value.
    pub fn merged_with(&self, other: &EmissionTotals) -> EmissionTotals {
        EmissionTotals {
            total: other.total.or(self.total),
            materials: other.materials.or(self.materials),
            energy: other.energy.or(self.energy),
            transport: other.transport.or(self.transport),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: CalculationId,
    pub status: CalculationStatus,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub totals: EmissionTotals,
    pub breakdown: Option<BTreeMap<String, f64>>,
    pub error_message: Option<String>,
}

impl CalculationRecord {
    pub fn pending(id: CalculationId, product_id: ProductId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: CalculationStatus::Pending,
            product_id,
            created_at: now,
            updated_at: now,
            totals: EmissionTotals::default(),
            breakdown: None,
            error_message: None,
        }
    }
}
