use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use footprint_core::config::{FootprintConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match FootprintConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let fields: Vec<(&str, String, Vec<&str>)> = vec![
        (
            "polling.interval_ms",
            config.polling.interval_ms.to_string(),
            vec!["FOOTPRINT_POLLING_INTERVAL_MS"],
        ),
        (
            "polling.max_attempts",
            config.polling.max_attempts.to_string(),
            vec!["FOOTPRINT_POLLING_MAX_ATTEMPTS"],
        ),
        (
            "wizard.proceed_rule",
            format!("{:?}", config.wizard.proceed_rule).to_ascii_lowercase(),
            vec!["FOOTPRINT_WIZARD_PROCEED_RULE"],
        ),
        ("database.url", config.database.url.clone(), vec!["FOOTPRINT_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            vec!["FOOTPRINT_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            vec!["FOOTPRINT_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            vec!["FOOTPRINT_LOGGING_LEVEL", "FOOTPRINT_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            vec!["FOOTPRINT_LOGGING_FORMAT", "FOOTPRINT_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        fields
            .iter()
            .map(|(key, value, env_keys)| render_line(key, value, source(key, env_keys.as_slice()))),
    );
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("footprint.toml"), PathBuf::from("config/footprint.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};

    #[test]
    fn nested_keys_resolve_against_file_document() {
        let doc: toml::Value = "[polling]\ninterval_ms = 500\n".parse().expect("toml");

        assert!(contains_path(&doc, "polling.interval_ms"));
        assert!(!contains_path(&doc, "polling.max_attempts"));
        assert_eq!(
            field_source("polling.interval_ms", &["FOOTPRINT_UNSET_FOR_TEST"], Some(&doc), None),
            "file (config file)"
        );
        assert_eq!(field_source("wizard.proceed_rule", &[], Some(&doc), None), "default");
    }
}
