use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use stocktalk_cli::commands::{ask, config, context, doctor, migrate, seed};
use tempfile::TempDir;

const TEST_KEY: &str = "AIzaTestKey0123456789";

#[test]
fn migrate_returns_success_with_valid_env() {
    let db = TempDatabase::new();
    with_env(&valid_env(&db), || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_without_api_key() {
    with_env(&[("STOCKTALK_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let db = TempDatabase::new();
    with_env(&valid_env(&db), || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "first seed failed: {}", first.output);
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");
        assert_eq!(
            first_payload["message"],
            "sample inventory loaded for account `demo`: 4 categories, 5 products, 8 sales"
        );

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "second seed failed: {}", second.output);
        assert_eq!(first_payload["message"], parse_payload(&second.output)["message"]);
    });
}

#[test]
fn context_reports_intents_and_live_sections_for_seeded_account() {
    let db = TempDatabase::new();
    with_env(&valid_env(&db), || {
        assert_eq!(seed::run().exit_code, 0);

        let result = context::run("demo", "how many gaming mouse in stock");
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Intents: product\n\nInventory Summary:"), "{message}");
        assert!(message.contains("Product Information (matching 'gaming mouse'):"), "{message}");
        assert!(!message.contains("SAMPLE DATA"), "{message}");
    });
}

#[test]
fn context_for_unknown_account_reports_empty_inventory() {
    let db = TempDatabase::new();
    with_env(&valid_env(&db), || {
        let result = context::run("nobody", "hello");
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Intents: none (summary only)\n\n"), "{message}");
    });
}

#[test]
fn ask_with_unreachable_model_returns_fallback_reply() {
    let db = TempDatabase::new();
    with_env(
        &[
            ("STOCKTALK_LLM_API_KEY", TEST_KEY),
            ("STOCKTALK_DATABASE_URL", db.url.as_str()),
            ("STOCKTALK_LLM_BASE_URL", "http://127.0.0.1:9"),
            ("STOCKTALK_LLM_TIMEOUT_SECS", "5"),
        ],
        || {
            let result = ask::run("demo", "what is my best seller?");
            assert_eq!(result.exit_code, 0, "{}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(
                payload["message"],
                "I couldn't reach the knowledge base. Please check your connection and try again."
            );
        },
    );
}

#[test]
fn ask_rejects_blank_questions() {
    let db = TempDatabase::new();
    with_env(&valid_env(&db), || {
        let result = ask::run("demo", "   ");
        assert_eq!(result.exit_code, 7);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_message");
    });
}

#[test]
fn config_redacts_api_key_and_attributes_env_source() {
    with_env(&[("GEMINI_API_KEY", TEST_KEY), ("STOCKTALK_DATABASE_URL", "sqlite::memory:")], || {
        let output = config::run();

        assert!(output.contains("- llm.api_key = AIza*** (source: env (GEMINI_API_KEY))"));
        assert!(!output.contains(TEST_KEY));
        assert!(output.contains("- database.url = sqlite::memory: (source: env"));
        assert!(output.contains("- llm.model = gemini-1.5-flash (source: default)"));
    });
}

#[test]
fn doctor_json_reports_pass_after_migrate() {
    let db = TempDatabase::new();
    with_env(&valid_env(&db), || {
        assert_eq!(migrate::run().exit_code, 0);
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["overall_status"], "pass");
        let names: Vec<&str> = payload["checks"]
            .as_array()
            .map(|checks| checks.iter().filter_map(|check| check["name"].as_str()).collect())
            .unwrap_or_default();
        let expected =
            ["config_validation", "model_settings", "database_connectivity", "schema_migrations"];
        assert_eq!(names, expected);
    });
}

#[test]
fn doctor_flags_unmigrated_database() {
    let db = TempDatabase::new();
    with_env(&valid_env(&db), || {
        let output = doctor::run(false);

        assert!(output.contains("- [ok] database_connectivity:"), "{output}");
        assert!(
            output.contains("- [fail] schema_migrations: 0 of 2 migrations applied"),
            "{output}"
        );
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[], || {
        let output = doctor::run(false);

        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] database_connectivity:"));
    });
}

struct TempDatabase {
    _dir: TempDir,
    url: String,
}

impl TempDatabase {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}", dir.path().join("stocktalk.db").display());
        Self { _dir: dir, url }
    }
}

fn valid_env(db: &TempDatabase) -> Vec<(&'static str, &str)> {
    vec![("STOCKTALK_LLM_API_KEY", TEST_KEY), ("STOCKTALK_DATABASE_URL", db.url.as_str())]
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|error| error.into_inner());

    let keys = [
        "STOCKTALK_DATABASE_URL",
        "STOCKTALK_DATABASE_MAX_CONNECTIONS",
        "STOCKTALK_DATABASE_TIMEOUT_SECS",
        "STOCKTALK_LLM_API_KEY",
        "GEMINI_API_KEY",
        "STOCKTALK_LLM_BASE_URL",
        "STOCKTALK_LLM_MODEL",
        "GEMINI_MODEL",
        "STOCKTALK_LLM_TIMEOUT_SECS",
        "STOCKTALK_LLM_MAX_RETRIES",
        "STOCKTALK_ASSISTANT_PRODUCT_LIMIT",
        "STOCKTALK_ASSISTANT_DEFAULT_CURRENCY",
        "STOCKTALK_SERVER_BIND_ADDRESS",
        "STOCKTALK_SERVER_PORT",
        "STOCKTALK_LOGGING_LEVEL",
        "STOCKTALK_LOGGING_FORMAT",
        "STOCKTALK_LOG_LEVEL",
        "STOCKTALK_LOG_FORMAT",
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
