use std::sync::Arc;

use footprint_core::calculation::{
    CalculationLifecycle, DeterministicCalculationService, EmissionFactor, StartOutcome,
};
use footprint_core::config::FootprintConfig;
use footprint_core::domain::product::{BomEntry, ProductId};
use footprint_core::domain::wizard::WizardStep;
use footprint_core::errors::{ApplicationError, DomainError};
use footprint_core::store::InMemoryStore;
use footprint_core::wizard::WizardController;
use serde_json::json;
use tracing::info;

use crate::commands::{correlation_id, load_config, runtime, CommandResult};

pub fn run(product: &str, components: &[String], polls_before_complete: u32) -> CommandResult {
    let config = match load_config("simulate") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let parsed = match parse_components(components) {
        Ok(parsed) => parsed,
        Err(error) => {
            return CommandResult::from_interface(
                "simulate",
                ApplicationError::from(error).into_interface(correlation_id("simulate")),
                None,
            );
        }
    };

    let runtime = match runtime("simulate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let product_id = ProductId(product.to_string());
    runtime.block_on(simulate(&config, product_id, parsed, polls_before_complete))
}

async fn simulate(
    config: &FootprintConfig,
    product_id: ProductId,
    components: Vec<(BomEntry, EmissionFactor)>,
    polls_before_complete: u32,
) -> CommandResult {
    let service = components
        .into_iter()
        .fold(DeterministicCalculationService::default(), |service, (entry, factor)| {
            service.with_component(product_id.clone(), entry, factor)
        })
        .with_polls_before_complete(polls_before_complete);
    let bom = service.bom_for(&product_id);

    let wizard = Arc::new(
        WizardController::new(Arc::new(InMemoryStore::default()), config.wizard.proceed_rule)
            .with_session_id(correlation_id("simulate")),
    );
    for step in [WizardStep::Select, WizardStep::Edit] {
        wizard.mark_step_complete(step).await;
        wizard.go_next().await;
    }

    let polling = config.polling_config();
    let lifecycle = CalculationLifecycle::new(Arc::new(service), wizard.clone(), polling.clone());

    match lifecycle.start_calculation(Some(&product_id), &bom).await {
        StartOutcome::Skipped => {
            return CommandResult::failure(
                "simulate",
                "precondition",
                "nothing to calculate: pass at least one --component",
                2,
            );
        }
        StartOutcome::Submitted(calculation_id) => {
            info!(
                event_name = "cli.simulate_submitted",
                calculation_id = %calculation_id,
                product_id = %product_id,
                "simulated calculation submitted"
            );
        }
        StartOutcome::SubmitFailed | StartOutcome::Cancelled => {}
    }

    while lifecycle.is_calculating() {
        tokio::time::sleep(polling.interval).await;
    }

    let snapshot = lifecycle.snapshot();
    let wizard_state = wizard.snapshot().await;
    let data = json!({ "calculation": snapshot, "wizard": wizard_state });

    match snapshot.error.clone() {
        Some(failure) => CommandResult::from_interface(
            "simulate",
            ApplicationError::from(failure).into_interface(correlation_id("simulate")),
            Some(data),
        ),
        None => {
            let total = snapshot.record.as_ref().and_then(|record| record.totals.total);
            CommandResult::success_with_data(
                "simulate",
                match total {
                    Some(total) => format!("calculation completed: {total:.3} kg CO2e"),
                    None => "calculation completed".to_string(),
                },
                Some(data),
            )
        }
    }
}

fn parse_components(raw: &[String]) -> Result<Vec<(BomEntry, EmissionFactor)>, DomainError> {
    raw.iter()
        .enumerate()
        .map(|(index, component)| parse_component(index + 1, component))
        .collect()
}

/// Parses `NAME:QTY:FACTOR`, where FACTOR is kg CO2e per unit.
fn parse_component(line: usize, raw: &str) -> Result<(BomEntry, EmissionFactor), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidComponent {
        input: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = raw.rsplitn(3, ':');
    let (Some(factor), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid("expected NAME:QTY:FACTOR"));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("component name is empty"));
    }
    let quantity = parse_non_negative(quantity).ok_or_else(|| invalid("quantity must be >= 0"))?;
    let factor = parse_non_negative(factor).ok_or_else(|| invalid("factor must be >= 0"))?;

    Ok((
        BomEntry::new(format!("line-{line}"), name, quantity, "unit"),
        EmissionFactor::materials_only(factor),
    ))
}

fn parse_non_negative(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite() && *value >= 0.0)
}

#[cfg(test)]
mod tests {
    use footprint_core::errors::DomainError;

    use super::{parse_component, parse_components};

    #[test]
    fn component_names_may_contain_colons() {
        let (entry, factor) = parse_component(1, "steel:grade 304:2:1.5").expect("parse");

        assert_eq!(entry.component_name, "steel:grade 304");
        assert_eq!(entry.quantity, 2.0);
        assert_eq!(factor.materials, 1.5);
        assert_eq!(entry.id, "line-1");
    }

    #[test]
    fn rejects_malformed_components() {
        for raw in ["steel", "steel:2", ":2:1", "steel:-1:2", "steel:2:x"] {
            assert!(
                matches!(parse_component(1, raw), Err(DomainError::InvalidComponent { .. })),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn lines_are_numbered_in_order() {
        let parsed = parse_components(&["a:1:1".to_string(), "b:2:2".to_string()]).expect("parse");
        let ids: Vec<&str> = parsed.iter().map(|(entry, _)| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["line-1", "line-2"]);
    }
}
