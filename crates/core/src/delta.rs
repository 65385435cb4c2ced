//! Pure comparison math between a baseline emissions figure and alternatives.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::scenario::ScenarioId;

/// Percentage reported when the baseline is zero and the alternative is not.
/// The sign follows the alternative.
pub const ZERO_BASELINE_PERCENTAGE: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaDirection {
    Increase,
    Decrease,
    Same,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeltaResult {
    pub scenario_id: ScenarioId,
    pub scenario_name: String,
    pub emissions: f64,
    pub absolute_delta: f64,
    pub percentage_delta: f64,
    pub direction: DeltaDirection,
}

/// Input row for [`calculate_deltas`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioEmissions {
    pub id: ScenarioId,
    pub name: String,
    pub emissions: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub category: String,
    pub baseline: f64,
    pub alternative: f64,
    pub absolute_delta: f64,
    pub percentage_delta: f64,
    pub direction: DeltaDirection,
}

pub fn percentage_delta(baseline: f64, alternative: f64) -> f64 {
    if baseline == 0.0 {
        if alternative == 0.0 {
            return 0.0;
        }
        return ZERO_BASELINE_PERCENTAGE.copysign(alternative);
    }
    (alternative - baseline) / baseline * 100.0
}

/// Exact classification; no tolerance is applied to tiny differences.
pub fn direction_of(absolute_delta: f64) -> DeltaDirection {
    if absolute_delta > 0.0 {
        DeltaDirection::Increase
    } else if absolute_delta < 0.0 {
        DeltaDirection::Decrease
    } else {
        DeltaDirection::Same
    }
}

pub fn calculate_delta(
    baseline: f64,
    alternative: f64,
    scenario_id: ScenarioId,
    scenario_name: impl Into<String>,
) -> DeltaResult {
    let absolute_delta = alternative - baseline;
    DeltaResult {
        scenario_id,
        scenario_name: scenario_name.into(),
        emissions: alternative,
        absolute_delta,
        percentage_delta: percentage_delta(baseline, alternative),
        direction: direction_of(absolute_delta),
    }
}

pub fn calculate_deltas(baseline: f64, scenarios: &[ScenarioEmissions]) -> Vec<DeltaResult> {
    scenarios
        .iter()
        .map(|scenario| {
            calculate_delta(baseline, scenario.emissions, scenario.id.clone(), scenario.name.clone())
        })
        .collect()
}

/// Per-category deltas over the union of both breakdowns. A category missing
/// on one side counts as zero there.
pub fn calculate_breakdown_deltas(
    baseline: &BTreeMap<String, f64>,
    alternative: &BTreeMap<String, f64>,
) -> Vec<CategoryDelta> {
    let categories: BTreeSet<&String> = baseline.keys().chain(alternative.keys()).collect();

    categories
        .into_iter()
        .map(|category| {
            let base = baseline.get(category).copied().unwrap_or(0.0);
            let alt = alternative.get(category).copied().unwrap_or(0.0);
            let absolute_delta = alt - base;
            CategoryDelta {
                category: category.clone(),
                baseline: base,
                alternative: alt,
                absolute_delta,
                percentage_delta: percentage_delta(base, alt),
                direction: direction_of(absolute_delta),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        calculate_breakdown_deltas, calculate_delta, calculate_deltas, DeltaDirection,
        ScenarioEmissions,
    };
    use crate::domain::scenario::ScenarioId;

    fn id(value: &str) -> ScenarioId {
        ScenarioId(value.to_string())
    }

    #[test]
    fn increase_decrease_and_same_against_nonzero_baseline() {
        let up = calculate_delta(100.0, 120.0, id("s"), "Up");
        assert_eq!(up.absolute_delta, 20.0);
        assert_eq!(up.percentage_delta, 20.0);
        assert_eq!(up.direction, DeltaDirection::Increase);
        assert_eq!(up.emissions, 120.0);

        let down = calculate_delta(100.0, 80.0, id("s"), "Down");
        assert_eq!(down.absolute_delta, -20.0);
        assert_eq!(down.percentage_delta, -20.0);
        assert_eq!(down.direction, DeltaDirection::Decrease);

        let same = calculate_delta(100.0, 100.0, id("s"), "Same");
        assert_eq!(same.absolute_delta, 0.0);
        assert_eq!(same.percentage_delta, 0.0);
        assert_eq!(same.direction, DeltaDirection::Same);
    }

    #[test]
    fn zero_baseline_uses_signed_hundred_percent() {
        let up = calculate_delta(0.0, 100.0, id("s"), "Up");
        assert_eq!(up.absolute_delta, 100.0);
        assert_eq!(up.percentage_delta, 100.0);
        assert_eq!(up.direction, DeltaDirection::Increase);

        let down = calculate_delta(0.0, -5.0, id("s"), "Credit");
        assert_eq!(down.percentage_delta, -100.0);
        assert_eq!(down.direction, DeltaDirection::Decrease);

        let both_zero = calculate_delta(0.0, 0.0, id("s"), "Zero");
        assert_eq!(both_zero.absolute_delta, 0.0);
        assert_eq!(both_zero.percentage_delta, 0.0);
        assert_eq!(both_zero.direction, DeltaDirection::Same);
    }

    #[test]
    fn tiny_differences_are_not_rounded_away() {
        let delta = calculate_delta(1.0, 1.0 + f64::EPSILON, id("s"), "Tiny");
        assert_eq!(delta.direction, DeltaDirection::Increase);

        let delta = calculate_delta(1.0, 1.0 - f64::EPSILON, id("s"), "Tiny");
        assert_eq!(delta.direction, DeltaDirection::Decrease);
    }

    #[test]
    fn batch_preserves_input_order() {
        let deltas = calculate_deltas(
            100.0,
            &[
                ScenarioEmissions { id: id("a"), name: "A".to_string(), emissions: 150.0 },
                ScenarioEmissions { id: id("b"), name: "B".to_string(), emissions: 50.0 },
            ],
        );

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].scenario_id, id("a"));
        assert_eq!(deltas[0].absolute_delta, 50.0);
        assert_eq!(deltas[0].direction, DeltaDirection::Increase);
        assert_eq!(deltas[1].scenario_id, id("b"));
        assert_eq!(deltas[1].absolute_delta, -50.0);
        assert_eq!(deltas[1].direction, DeltaDirection::Decrease);
    }

    #[test]
    fn empty_batch_yields_empty_result() {
        assert!(calculate_deltas(100.0, &[]).is_empty());
    }

    #[test]
    fn breakdown_deltas_cover_union_of_categories() {
        let baseline = BTreeMap::from([
            ("energy".to_string(), 10.0),
            ("materials".to_string(), 40.0),
        ]);
        let alternative = BTreeMap::from([
            ("materials".to_string(), 30.0),
            ("transport".to_string(), 5.0),
        ]);

        let deltas = calculate_breakdown_deltas(&baseline, &alternative);
        let categories: Vec<&str> = deltas.iter().map(|delta| delta.category.as_str()).collect();

        assert_eq!(categories, vec!["energy", "materials", "transport"]);
        assert_eq!(deltas[0].absolute_delta, -10.0);
        assert_eq!(deltas[0].percentage_delta, -100.0);
        assert_eq!(deltas[1].percentage_delta, -25.0);
        assert_eq!(deltas[2].direction, DeltaDirection::Increase);
        assert_eq!(deltas[2].percentage_delta, 100.0);
    }
}
