use std::env;
use std::sync::{Mutex, OnceLock};

use footprint_cli::commands::wizard::WizardCommand;
use footprint_cli::commands::{compare, doctor, migrate, simulate, wizard};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("FOOTPRINT_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("FOOTPRINT_DATABASE_URL", "postgres://localhost/footprint")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_after_migrate_on_file_database() {
    let dir = TempDir::new().expect("temp dir");
    let url = file_url(&dir);

    with_env(&[("FOOTPRINT_DATABASE_URL", url.as_str())], || {
        let before = doctor::run(true);
        assert_eq!(before.exit_code, 1, "schema check should fail before migrate");
        let report = parse_payload(&before.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(check_status(&report, "database_connectivity"), "pass");
        assert_eq!(check_status(&report, "store_schema"), "fail");

        assert_eq!(migrate::run().exit_code, 0);

        let after = doctor::run(true);
        assert_eq!(after.exit_code, 0, "all checks should pass after migrate");
        let report = parse_payload(&after.output);
        assert_eq!(report["overall_status"], "pass");
        assert_eq!(check_status(&report, "polling_budget"), "pass");
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("FOOTPRINT_POLLING_MAX_ATTEMPTS", "0")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(check_status(&report, "config_validation"), "fail");
        assert_eq!(check_status(&report, "database_connectivity"), "skipped");
    });
}

#[test]
fn wizard_state_persists_across_invocations() {
    let dir = TempDir::new().expect("temp dir");
    let url = file_url(&dir);

    with_env(&[("FOOTPRINT_DATABASE_URL", url.as_str())], || {
        let shown = parse_payload(&wizard::run(WizardCommand::Show).output);
        assert_eq!(shown["data"]["state"]["current_step"], "select");

        let blocked = wizard::run(WizardCommand::Next);
        assert_eq!(blocked.exit_code, 1, "strict rule blocks an incomplete step");
        let payload = parse_payload(&blocked.output);
        assert_eq!(payload["error_class"], "step_rejected");
        assert_eq!(payload["data"]["state"]["current_step"], "select");

        let completed = wizard::run(WizardCommand::Complete { step: "select".to_string() });
        assert_eq!(completed.exit_code, 0);
        let advanced = wizard::run(WizardCommand::Next);
        assert_eq!(advanced.exit_code, 0);

        let shown = parse_payload(&wizard::run(WizardCommand::Show).output);
        assert_eq!(shown["data"]["state"]["current_step"], "edit");
        assert_eq!(shown["data"]["state"]["can_go_back"], true);
        assert_eq!(shown["data"]["state"]["can_proceed"], false);

        let skipped = wizard::run(WizardCommand::Goto { step: "results".to_string() });
        assert_eq!(skipped.exit_code, 1, "forward jump over incomplete steps is rejected");

        assert_eq!(wizard::run(WizardCommand::Reset).exit_code, 0);
        let shown = parse_payload(&wizard::run(WizardCommand::Show).output);
        assert_eq!(shown["data"]["state"]["current_step"], "select");
    });
}

#[test]
fn wizard_rejects_unknown_step_names() {
    with_env(&[("FOOTPRINT_DATABASE_URL", "sqlite::memory:")], || {
        let result = wizard::run(WizardCommand::Complete { step: "checkout".to_string() });
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_input");
        assert!(payload["message"].as_str().unwrap_or_default().contains("checkout"));
        assert!(payload["correlation_id"].as_str().is_some());
    });
}

#[test]
fn compare_reports_deltas_against_baseline() {
    let result = compare::run(100.0, &["recycled=80".to_string(), "same=100".to_string()]);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    let deltas = payload["data"]["deltas"].as_array().expect("deltas array");
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0]["scenario_name"], "recycled");
    assert_eq!(deltas[0]["absolute_delta"], -20.0);
    assert_eq!(deltas[0]["percentage_delta"], -20.0);
    assert_eq!(deltas[0]["direction"], "decrease");
    assert_eq!(deltas[1]["direction"], "same");
}

#[test]
fn compare_handles_zero_baseline_without_failing() {
    let result = compare::run(0.0, &["new=100".to_string()]);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["deltas"][0]["absolute_delta"], 100.0);
    assert_eq!(payload["data"]["deltas"][0]["direction"], "increase");
}

#[test]
fn compare_rejects_malformed_scenario() {
    let result = compare::run(100.0, &["recycled".to_string()]);
    assert_eq!(result.exit_code, 2);
    assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
}

#[test]
fn simulate_completes_and_moves_wizard_to_results() {
    with_env(&[("FOOTPRINT_POLLING_INTERVAL_MS", "10")], || {
        let result = simulate::run(
            "kettle",
            &["steel:1.5:2".to_string(), "element:1:4".to_string()],
            1,
        );
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["calculation"]["is_calculating"], false);
        assert_eq!(payload["data"]["calculation"]["record"]["totals"]["total"], 7.0);
        assert_eq!(payload["data"]["wizard"]["current_step"], "results");
    });
}

#[test]
fn simulate_times_out_after_configured_attempts() {
    with_env(
        &[("FOOTPRINT_POLLING_INTERVAL_MS", "5"), ("FOOTPRINT_POLLING_MAX_ATTEMPTS", "3")],
        || {
            let result = simulate::run("kettle", &["steel:1:1".to_string()], 50);
            assert_eq!(result.exit_code, 6);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "service_unavailable");
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.contains("calculation timeout: no result after 3 status checks"));
            assert_eq!(payload["data"]["calculation"]["attempts"], 3);
            assert_eq!(payload["data"]["wizard"]["current_step"], "calculate");
        },
    );
}

#[test]
fn simulate_without_components_is_a_precondition_failure() {
    with_env(&[], || {
        let result = simulate::run("kettle", &[], 1);
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "precondition");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn check_status(report: &Value, name: &str) -> String {
    report["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn file_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("footprint.db").display())
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "FOOTPRINT_POLLING_INTERVAL_MS",
        "FOOTPRINT_POLLING_MAX_ATTEMPTS",
        "FOOTPRINT_WIZARD_PROCEED_RULE",
        "FOOTPRINT_DATABASE_URL",
        "FOOTPRINT_DATABASE_MAX_CONNECTIONS",
        "FOOTPRINT_DATABASE_TIMEOUT_SECS",
        "FOOTPRINT_LOGGING_LEVEL",
        "FOOTPRINT_LOGGING_FORMAT",
        "FOOTPRINT_LOG_LEVEL",
        "FOOTPRINT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
