use footprint_core::comparison::{build_comparison, ComparisonReport};
use footprint_core::domain::product::ProductId;
use footprint_core::domain::scenario::{ScenarioPatch, ScenarioResults};
use footprint_core::errors::{ApplicationError, DomainError};
use footprint_core::scenario::ScenarioRegistry;

use crate::commands::{correlation_id, CommandResult};

pub fn run(baseline: f64, scenarios: &[String]) -> CommandResult {
    match compare(baseline, scenarios) {
        Ok(report) => match serde_json::to_value(&report) {
            Ok(data) => CommandResult::success_with_data(
                "compare",
                format!("compared {} scenario(s) against the baseline", report.deltas.len()),
                Some(data),
            ),
            Err(error) => CommandResult::failure("compare", "serialization", error.to_string(), 7),
        },
        Err(error) => CommandResult::from_interface(
            "compare",
            error.into_interface(correlation_id("compare")),
            None,
        ),
    }
}

fn compare(
    baseline: f64,
    scenarios: &[String],
) -> Result<ComparisonReport, ApplicationError> {
    if !baseline.is_finite() {
        return Err(DomainError::InvalidScenarioInput {
            input: baseline.to_string(),
            reason: "baseline total must be a finite number".to_string(),
        }
        .into());
    }

    let product = ProductId("cli".to_string());
    let mut registry = ScenarioRegistry::new();

    let baseline_id = registry.create_scenario("baseline", product.clone(), None);
    registry.update_scenario(&baseline_id, ScenarioPatch::with_results(totals(baseline)));

    for raw in scenarios {
        let (name, total) = parse_scenario(raw)?;
        let id = registry.create_scenario(name, product.clone(), Some(&baseline_id));
        registry.update_scenario(&id, ScenarioPatch::with_results(totals(total)));
        registry.add_to_comparison(&id);
    }

    build_comparison(&registry).ok_or_else(|| {
        DomainError::InvariantViolation("baseline scenario has no results".to_string()).into()
    })
}

fn totals(total_emissions: f64) -> ScenarioResults {
    ScenarioResults { total_emissions, breakdown: None }
}

fn parse_scenario(raw: &str) -> Result<(&str, f64), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidScenarioInput {
        input: raw.to_string(),
        reason: reason.to_string(),
    };

    let (name, value) = raw.split_once('=').ok_or_else(|| invalid("expected NAME=TOTAL"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("scenario name is empty"));
    }
    let total = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|total| total.is_finite())
        .ok_or_else(|| invalid("total must be a finite number"))?;

    Ok((name, total))
}
