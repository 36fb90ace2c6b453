use std::env;
use std::sync::{Mutex, OnceLock};

use marea_cli::commands::{migrate, seed, show};
use serde_json::Value;

#[test]
fn migrate_returns_success_against_in_memory_db() {
    with_env(&[("MAREA_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn seed_loads_and_verifies_the_demo_fixtures() {
    with_env(&[("MAREA_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("8 products"));
        assert!(message.contains("4 customers"));
    });
}

#[test]
fn show_reports_not_found_for_a_missing_budget() {
    // An in-memory db lives per connection, so schema and lookup need a
    // shared file-backed database across the two commands.
    let db_path = env::temp_dir().join(format!("marea-cli-show-{}.db", std::process::id()));
    let url = format!("sqlite://{}?mode=rwc", db_path.display());

    with_env(&[("MAREA_DATABASE_URL", url.as_str())], || {
        let migrated = migrate::run();
        assert_eq!(migrated.exit_code, 0);

        let result = show::run("B-missing");
        assert_eq!(result.exit_code, 1, "expected not-found exit code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "show");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "not_found");
    });

    let _ = std::fs::remove_file(&db_path);
}

#[test]
fn config_failure_surfaces_as_exit_code_two() {
    with_env(&[("MAREA_LLM_MAX_RETRIES", "not-a-number")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "MAREA_CONFIG",
        "MAREA_DATABASE_URL",
        "MAREA_LOG_LEVEL",
        "MAREA_LLM_MODEL",
        "MAREA_LLM_API_KEY",
        "MAREA_LLM_MAX_RETRIES",
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
