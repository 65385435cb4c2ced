use std::sync::Arc;

use clap::Subcommand;
use footprint_core::domain::wizard::WizardStep;
use footprint_core::errors::{ApplicationError, DomainError};
use footprint_core::store::PersistentStore;
use footprint_core::wizard::{StepChange, WizardController};
use serde_json::json;

use crate::commands::{correlation_id, load_config, open_store, runtime, CommandResult};

#[derive(Debug, Subcommand)]
pub enum WizardCommand {
    #[command(about = "Print the current wizard state")]
    Show,
    #[command(about = "Advance one step if the current step allows it")]
    Next,
    #[command(about = "Go back one step")]
    Back,
    #[command(about = "Jump to a step; forward jumps need every earlier step complete")]
    Goto { step: String },
    #[command(about = "Mark a step complete")]
    Complete { step: String },
    #[command(about = "Mark a step incomplete")]
    Incomplete { step: String },
    #[command(about = "Return to the first step and clear completion")]
    Reset,
}

pub fn run(command: WizardCommand) -> CommandResult {
    let config = match load_config("wizard") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("wizard") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    runtime.block_on(async {
        let store: Arc<dyn PersistentStore> = match open_store(&config).await {
            Ok(store) => store,
            Err(error) => {
                return CommandResult::failure("wizard", "db_connectivity", format!("{error:#}"), 4)
            }
        };
        let wizard = WizardController::restore(store, config.wizard.proceed_rule)
            .await
            .with_session_id(correlation_id("wizard"));

        match apply(&wizard, command).await {
            Ok(change) => {
                let state = wizard.snapshot().await;
                let rejected = change.as_ref().is_some_and(StepChange::is_rejected);
                let message = if rejected {
                    format!("move rejected; wizard stays on {}", state.current_step)
                } else {
                    format!("current step: {}", state.current_step)
                };
                let data = json!({ "change": change, "state": state });
                if rejected {
                    return CommandResult::failure_with_data(
                        "wizard",
                        "step_rejected",
                        message,
                        1,
                        Some(data),
                    );
                }
                CommandResult::success_with_data("wizard", message, Some(data))
            }
            Err(error) => CommandResult::from_interface(
                "wizard",
                error.into_interface(correlation_id("wizard")),
                None,
            ),
        }
    })
}

async fn apply(
    wizard: &WizardController,
    command: WizardCommand,
) -> Result<Option<StepChange>, ApplicationError> {
    let change = match command {
        WizardCommand::Show => return Ok(None),
        WizardCommand::Next => wizard.go_next().await,
        WizardCommand::Back => wizard.go_back().await,
        WizardCommand::Goto { step } => wizard.set_step(parse_step(&step)?).await,
        WizardCommand::Complete { step } => wizard.mark_step_complete(parse_step(&step)?).await,
        WizardCommand::Incomplete { step } => {
            wizard.mark_step_incomplete(parse_step(&step)?).await
        }
        WizardCommand::Reset => wizard.reset().await,
    };
    Ok(Some(change))
}

fn parse_step(raw: &str) -> Result<WizardStep, ApplicationError> {
    WizardStep::parse(raw).ok_or_else(|| DomainError::UnknownStep(raw.to_string()).into())
}
