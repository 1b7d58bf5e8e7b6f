use std::env;
use std::sync::{Mutex, OnceLock};

use foody_cli::commands::{config, doctor, migrate, redrive, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("FOODY_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_invalid_queue_settings() {
    with_env(
        &[("FOODY_DATABASE_URL", "sqlite::memory:"), ("FOODY_QUEUE_MAX_MESSAGES", "50")],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 2, "expected config validation failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn migrate_reports_non_sqlite_url_as_config_failure() {
    with_env(&[("FOODY_DATABASE_URL", "postgres://localhost/foody")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

#[test]
fn seed_returns_catalog_summary() {
    with_env(&[("FOODY_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected deterministic seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("restaurant catalog manhattan-2026-10 loaded for Manhattan"));
        for cuisine in ["Chinese", "French", "Indian", "Italian", "Japanese", "Mexican", "Thai"] {
            assert!(message.contains(&format!("  - {cuisine}: ")), "missing {cuisine} in {message}");
        }
    });
}

#[test]
fn seed_is_idempotent_against_the_same_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("foody.db").display());

    with_env(&[("FOODY_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn doctor_passes_after_migrate_and_seed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("foody.db").display());

    with_env(&[("FOODY_DATABASE_URL", url.as_str())], || {
        assert_eq!(migrate::run().exit_code, 0);
        assert_eq!(seed::run().exit_code, 0);

        let report = parse_payload(&doctor::run(true));
        assert_eq!(report["overall_status"], "pass", "report: {report}");

        let checks = report["checks"].as_array().cloned().unwrap_or_default();
        let status_of = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].clone())
                .unwrap_or(Value::Null)
        };
        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("database_connectivity"), "pass");
        assert_eq!(status_of("catalog_readiness"), "pass");
        assert_eq!(status_of("queue_depth"), "pass");
        assert_eq!(status_of("mail_readiness"), "pass");
        assert_eq!(status_of("nlu_readiness"), "skipped");
    });
}

#[test]
fn doctor_flags_empty_catalog() {
    with_env(&[("FOODY_DATABASE_URL", "sqlite::memory:")], || {
        let report = parse_payload(&doctor::run(true));
        assert_eq!(report["overall_status"], "fail");
    });
}

#[test]
fn redrive_reports_requeued_count() {
    with_env(&[("FOODY_DATABASE_URL", "sqlite::memory:")], || {
        let result = redrive::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "redrive");
        assert_eq!(payload["message"], "requeued 0 dead-lettered suggestion request(s)");
    });
}

#[test]
fn config_attributes_env_sources_and_redacts_secrets() {
    with_env(
        &[
            ("FOODY_DATABASE_URL", "sqlite::memory:"),
            ("FOODY_MAIL_PROVIDER", "http"),
            ("FOODY_MAIL_BASE_URL", "https://mail.example"),
            ("FOODY_MAIL_API_KEY", "super-secret-key"),
        ],
        || {
            let output = config::run();

            assert!(output.contains("- database.url = sqlite::memory: (source: env (FOODY_DATABASE_URL))"));
            assert!(output.contains("- mail.api_key = <redacted> (source: env (FOODY_MAIL_API_KEY))"));
            assert!(output.contains("- queue.visibility_timeout_secs = 40 (source: default)"));
            assert!(!output.contains("super-secret-key"));
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "FOODY_DATABASE_URL",
        "FOODY_DATABASE_MAX_CONNECTIONS",
        "FOODY_DATABASE_TIMEOUT_SECS",
        "FOODY_SERVER_BIND_ADDRESS",
        "FOODY_SERVER_PORT",
        "FOODY_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "FOODY_NLU_ENABLED",
        "FOODY_NLU_BASE_URL",
        "FOODY_NLU_BOT_ID",
        "FOODY_NLU_BOT_ALIAS_ID",
        "FOODY_NLU_LOCALE_ID",
        "FOODY_NLU_API_KEY",
        "FOODY_NLU_TIMEOUT_SECS",
        "FOODY_QUEUE_WORKER_ENABLED",
        "FOODY_QUEUE_MAX_MESSAGES",
        "FOODY_QUEUE_VISIBILITY_TIMEOUT_SECS",
        "FOODY_QUEUE_WAIT_TIME_SECS",
        "FOODY_QUEUE_MAX_RECEIVE_COUNT",
        "FOODY_SEARCH_BASE_URL",
        "FOODY_SEARCH_INDEX",
        "FOODY_SEARCH_USERNAME",
        "FOODY_SEARCH_PASSWORD",
        "FOODY_SEARCH_MAX_HITS",
        "FOODY_SEARCH_TIMEOUT_SECS",
        "FOODY_MAIL_PROVIDER",
        "FOODY_MAIL_SENDER",
        "FOODY_MAIL_BASE_URL",
        "FOODY_MAIL_API_KEY",
        "FOODY_MAIL_TIMEOUT_SECS",
        "FOODY_DIALOG_SUPPORTED_LOCATIONS",
        "FOODY_DIALOG_SUGGESTION_COUNT",
        "FOODY_LOGGING_LEVEL",
        "FOODY_LOGGING_FORMAT",
        "FOODY_LOG_LEVEL",
        "FOODY_LOG_FORMAT",
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
