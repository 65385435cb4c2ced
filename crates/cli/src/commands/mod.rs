pub mod compare;
pub mod config;
pub mod doctor;
pub mod migrate;
pub mod simulate;
pub mod wizard;

use std::sync::Arc;

use anyhow::Context;
use footprint_core::config::{FootprintConfig, LoadOptions};
use footprint_core::errors::InterfaceError;
use footprint_db::{connect_with_config, migrations, SqlKeyValueStore};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_data(command, error_class, message, exit_code, None)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure carrying the user-safe message, the detail and the correlation id.
    pub fn from_interface(command: &str, error: InterfaceError, data: Option<Value>) -> Self {
        let (error_class, exit_code) = match &error {
            InterfaceError::BadRequest { .. } => ("invalid_input", 2),
            InterfaceError::ServiceUnavailable { .. } => ("service_unavailable", 6),
            InterfaceError::Internal { .. } => ("internal", 7),
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({error})", error.user_message()),
            correlation_id: Some(error.correlation_id().to_string()),
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub(crate) fn correlation_id(command: &str) -> String {
    format!("cli-{command}-{}", std::process::id())
}

pub(crate) fn load_config(command: &str) -> Result<FootprintConfig, CommandResult> {
    FootprintConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })
}

pub(crate) fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Connects, applies pending migrations and wraps the pool as a store.
pub(crate) async fn open_store(config: &FootprintConfig) -> anyhow::Result<Arc<SqlKeyValueStore>> {
    let pool = connect_with_config(&config.database)
        .await
        .with_context(|| format!("failed to connect to `{}`", config.database.url))?;
    migrations::run_pending(&pool).await.context("failed to apply migrations")?;
    Ok(Arc::new(SqlKeyValueStore::new(pool)))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
