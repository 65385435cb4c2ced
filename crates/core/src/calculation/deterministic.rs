use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::calculation::client::{
    CalculationServiceClient, ServiceError, StatusReport, SubmitCalculation, SubmitReceipt,
};
use crate::domain::calculation::{CalculationId, CalculationStatus, EmissionTotals};
use crate::domain::product::{BomEntry, ProductId};

/// kg CO2e per unit of a BOM line, split by lifecycle category.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmissionFactor {
    pub materials: f64,
    pub energy: f64,
    pub transport: f64,
}

impl EmissionFactor {
    pub fn materials_only(kg_co2e_per_unit: f64) -> Self {
        Self { materials: kg_co2e_per_unit, ..Self::default() }
    }

    fn per_unit(&self) -> f64 {
        self.materials + self.energy + self.transport
    }
}

struct Run {
    product_id: ProductId,
    polls: u32,
}

/// In-process calculation service with a fixed product catalog.
///
/// Each calculation reports `in_progress` for `polls_before_complete` status
/// checks and then completes with totals computed from the catalog BOM. A run
/// is forgotten once it has reported completion.
pub struct DeterministicCalculationService {
    catalog: HashMap<ProductId, Vec<(BomEntry, EmissionFactor)>>,
    polls_before_complete: u32,
    runs: Mutex<HashMap<CalculationId, Run>>,
    next_id: AtomicU64,
}

impl Default for DeterministicCalculationService {
    fn default() -> Self {
        Self {
            catalog: HashMap::new(),
            polls_before_complete: 1,
            runs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl DeterministicCalculationService {
    pub fn with_component(
        mut self,
        product_id: ProductId,
        entry: BomEntry,
        factor: EmissionFactor,
    ) -> Self {
        self.catalog.entry(product_id).or_default().push((entry, factor));
        self
    }

    pub fn with_polls_before_complete(mut self, polls: u32) -> Self {
        self.polls_before_complete = polls;
        self
    }

    pub fn bom_for(&self, product_id: &ProductId) -> Vec<BomEntry> {
        self.catalog
            .get(product_id)
            .map(|lines| lines.iter().map(|(entry, _)| entry.clone()).collect())
            .unwrap_or_default()
    }

    fn completed_report(&self, product_id: &ProductId) -> StatusReport {
        let mut totals = EmissionTotals {
            total: Some(0.0),
            materials: Some(0.0),
            energy: Some(0.0),
            transport: Some(0.0),
        };
        let mut breakdown = BTreeMap::new();

        for (entry, factor) in self.catalog.get(product_id).into_iter().flatten() {
            let line_total = entry.quantity * factor.per_unit();
            add(&mut totals.materials, entry.quantity * factor.materials);
            add(&mut totals.energy, entry.quantity * factor.energy);
            add(&mut totals.transport, entry.quantity * factor.transport);
            add(&mut totals.total, line_total);
            *breakdown.entry(entry.component_name.clone()).or_insert(0.0) += line_total;
        }

        StatusReport {
            status: CalculationStatus::Completed,
            totals,
            breakdown: Some(breakdown),
            error_message: None,
        }
    }
}

fn add(slot: &mut Option<f64>, value: f64) {
    *slot = Some(slot.unwrap_or(0.0) + value);
}

#[async_trait]
impl CalculationServiceClient for DeterministicCalculationService {
    async fn submit(&self, request: &SubmitCalculation) -> Result<SubmitReceipt, ServiceError> {
        if !self.catalog.contains_key(&request.product_id) {
            return Err(ServiceError::Rejected(format!(
                "unknown product `{}`",
                request.product_id
            )));
        }

        let sequence = self.next_id.fetch_add(1, Ordering::SeqCst);
        let calculation_id = CalculationId(format!("calc-{sequence:04}"));
        let mut runs = match self.runs.lock() {
            Ok(runs) => runs,
            Err(poisoned) => poisoned.into_inner(),
        };
        runs.insert(
            calculation_id.clone(),
            Run { product_id: request.product_id.clone(), polls: 0 },
        );

        Ok(SubmitReceipt { calculation_id, status: CalculationStatus::Pending })
    }

    async fn get_status(
        &self,
        calculation_id: &CalculationId,
    ) -> Result<StatusReport, ServiceError> {
        let (product_id, polls) = {
            let mut runs = match self.runs.lock() {
                Ok(runs) => runs,
                Err(poisoned) => poisoned.into_inner(),
            };
            let Some(run) = runs.get_mut(calculation_id) else {
                return Ok(StatusReport::failed(format!("unknown calculation `{calculation_id}`")));
            };
            run.polls += 1;
            let polls = run.polls;
            let product_id = run.product_id.clone();
            if polls > self.polls_before_complete {
                runs.remove(calculation_id);
            }
            (product_id, polls)
        };

        if polls <= self.polls_before_complete {
            return Ok(StatusReport::with_status(CalculationStatus::InProgress));
        }
        Ok(self.completed_report(&product_id))
    }
}
