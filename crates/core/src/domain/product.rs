use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of a bill of materials.
///
/// `emissions` is the per-line CO2e figure once a calculation has attributed
/// one; freshly edited lines carry `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BomEntry {
    pub id: String,
    pub component_name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions: Option<f64>,
}

impl BomEntry {
    pub fn new(
        id: impl Into<String>,
        component_name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            component_name: component_name.into(),
            quantity,
            unit: unit.into(),
            emissions: None,
        }
    }
}
