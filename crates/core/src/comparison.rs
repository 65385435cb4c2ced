use serde::Serialize;

use crate::delta::{
    calculate_breakdown_deltas, calculate_deltas, CategoryDelta, DeltaResult, ScenarioEmissions,
};
use crate::domain::scenario::ScenarioId;
use crate::scenario::ScenarioRegistry;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub baseline_id: ScenarioId,
    pub baseline_name: String,
    pub baseline_emissions: f64,
    pub deltas: Vec<DeltaResult>,
    pub category_deltas: Vec<(ScenarioId, Vec<CategoryDelta>)>,
    /// Comparison-set scenarios left out because they have no results yet.
    pub pending: Vec<ScenarioId>,
}

/// Compares every scenario in the comparison set against the baseline.
///
/// Returns `None` when there is no baseline or it has not been calculated.
/// The baseline itself is skipped if it is part of the comparison set.
pub fn build_comparison(registry: &ScenarioRegistry) -> Option<ComparisonReport> {
    let baseline = registry.baseline()?;
    let baseline_results = baseline.results.as_ref()?;

    let mut rows = Vec::new();
    let mut category_deltas = Vec::new();
    let mut pending = Vec::new();

    for scenario in registry.comparison_scenarios() {
        if scenario.id == baseline.id {
            continue;
        }
        let Some(results) = scenario.results.as_ref() else {
            pending.push(scenario.id.clone());
            continue;
        };

        rows.push(ScenarioEmissions {
            id: scenario.id.clone(),
            name: scenario.name.clone(),
            emissions: results.total_emissions,
        });
        if let (Some(base), Some(alt)) = (&baseline_results.breakdown, &results.breakdown) {
            category_deltas.push((scenario.id.clone(), calculate_breakdown_deltas(base, alt)));
        }
    }

    Some(ComparisonReport {
        baseline_id: baseline.id.clone(),
        baseline_name: baseline.name.clone(),
        baseline_emissions: baseline_results.total_emissions,
        deltas: calculate_deltas(baseline_results.total_emissions, &rows),
        category_deltas,
        pending,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::build_comparison;
    use crate::delta::DeltaDirection;
    use crate::domain::product::ProductId;
    use crate::domain::scenario::{ScenarioPatch, ScenarioResults};
    use crate::scenario::ScenarioRegistry;

    fn results(total: f64, materials: f64) -> ScenarioResults {
        ScenarioResults {
            total_emissions: total,
            breakdown: Some(BTreeMap::from([("materials".to_string(), materials)])),
        }
    }

    #[test]
    fn no_report_without_calculated_baseline() {
        let mut registry = ScenarioRegistry::new();
        assert!(build_comparison(&registry).is_none());

        registry.create_scenario("Baseline", ProductId("p".to_string()), None);
        assert!(build_comparison(&registry).is_none());
    }

    #[test]
    fn report_follows_comparison_order_and_skips_uncalculated() {
        let product = ProductId("p".to_string());
        let mut registry = ScenarioRegistry::new();
        let baseline = registry.create_scenario("Baseline", product.clone(), None);
        let heavy = registry.clone_scenario(&baseline, "Heavy");
        let light = registry.clone_scenario(&baseline, "Light");
        let draft = registry.clone_scenario(&baseline, "Draft");

        registry.update_scenario(&baseline, ScenarioPatch::with_results(results(100.0, 80.0)));
        registry.update_scenario(&heavy, ScenarioPatch::with_results(results(150.0, 120.0)));
        registry.update_scenario(&light, ScenarioPatch::with_results(results(50.0, 40.0)));

        for id in [&baseline, &heavy, &draft, &light] {
            registry.add_to_comparison(id);
        }

        let report = build_comparison(&registry).expect("report");

        assert_eq!(report.baseline_emissions, 100.0);
        assert_eq!(report.deltas.len(), 2);
        assert_eq!(report.deltas[0].scenario_id, heavy);
        assert_eq!(report.deltas[0].direction, DeltaDirection::Increase);
        assert_eq!(report.deltas[1].scenario_id, light);
        assert_eq!(report.deltas[1].absolute_delta, -50.0);
        assert_eq!(report.pending, vec![draft]);
        assert_eq!(report.category_deltas.len(), 2);
        assert_eq!(report.category_deltas[1].1[0].absolute_delta, -40.0);
    }
}
