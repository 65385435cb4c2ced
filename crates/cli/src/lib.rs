pub mod commands;

use clap::{Parser, Subcommand};
use footprint_core::config::{FootprintConfig, LoadOptions, LogFormat};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "footprint",
    about = "Footprint operator CLI",
    long_about = "Inspect configuration, check readiness, apply migrations, drive the calculation wizard, and compare scenario emissions.",
    after_help = "Examples:\n  footprint doctor --json\n  footprint wizard complete select\n  footprint compare --baseline 100 recycled=80 heavier=120\n  footprint simulate --product kettle --component steel:1.5:2.0"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Read or move the persisted calculation wizard")]
    Wizard {
        #[command(subcommand)]
        action: commands::wizard::WizardCommand,
    },
    #[command(about = "Compare scenario totals against a baseline total")]
    Compare {
        #[arg(long, help = "Baseline total in kg CO2e")]
        baseline: f64,
        #[arg(required = true, value_name = "NAME=TOTAL", help = "Alternative scenario totals")]
        scenarios: Vec<String>,
    },
    #[command(about = "Run a calculation against the in-process deterministic service")]
    Simulate {
        #[arg(long, help = "Product identifier to calculate")]
        product: String,
        #[arg(
            long = "component",
            value_name = "NAME:QTY:FACTOR",
            help = "BOM line with its kg CO2e per unit factor; repeatable"
        )]
        components: Vec<String>,
        #[arg(long, default_value_t = 1, help = "Status checks that report in_progress")]
        polls_before_complete: u32,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Wizard { action } => commands::wizard::run(action),
        Command::Compare { baseline, scenarios } => commands::compare::run(baseline, &scenarios),
        Command::Simulate { product, components, polls_before_complete } => {
            commands::simulate::run(&product, &components, polls_before_complete)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr; stdout carries command output only. Config errors are
/// reported by the commands themselves, so logging falls back to defaults.
fn init_logging() {
    use tracing::Level;

    let config = FootprintConfig::load(LoadOptions::default()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!(event_name = "cli.logging_already_installed", "subscriber already set");
    }
}
