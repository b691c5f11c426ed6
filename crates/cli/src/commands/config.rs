use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use stocktalk_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in effective_values(&config) {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

type Field = (&'static str, String, &'static [&'static str]);

fn field(key: &'static str, value: String, env_keys: &'static [&'static str]) -> Field {
    (key, value, env_keys)
}

fn effective_values(config: &AppConfig) -> Vec<Field> {
    vec![
        field("database.url", config.database.url.clone(), &["STOCKTALK_DATABASE_URL"]),
        field(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["STOCKTALK_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["STOCKTALK_DATABASE_TIMEOUT_SECS"],
        ),
        field(
            "llm.api_key",
            redact_key(config.llm.api_key.as_ref()),
            &["STOCKTALK_LLM_API_KEY", "GEMINI_API_KEY"],
        ),
        field("llm.base_url", config.llm.base_url.clone(), &["STOCKTALK_LLM_BASE_URL"]),
        field("llm.model", config.llm.model.clone(), &["STOCKTALK_LLM_MODEL", "GEMINI_MODEL"]),
        field(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["STOCKTALK_LLM_TIMEOUT_SECS"],
        ),
        field(
            "llm.max_retries",
            config.llm.max_retries.to_string(),
            &["STOCKTALK_LLM_MAX_RETRIES"],
        ),
        field(
            "assistant.product_limit",
            config.assistant.product_limit.to_string(),
            &["STOCKTALK_ASSISTANT_PRODUCT_LIMIT"],
        ),
        field(
            "assistant.default_currency",
            config.assistant.default_currency.code().to_string(),
            &["STOCKTALK_ASSISTANT_DEFAULT_CURRENCY"],
        ),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["STOCKTALK_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["STOCKTALK_SERVER_PORT"]),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["STOCKTALK_LOGGING_LEVEL", "STOCKTALK_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["STOCKTALK_LOGGING_FORMAT", "STOCKTALK_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("stocktalk.toml"), PathBuf::from("config/stocktalk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
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

/// Keeps the first four characters of long keys so operators can tell keys apart.
fn redact_key(key: Option<&SecretString>) -> String {
    let Some(key) = key else {
        return "<unset>".to_string();
    };
    let trimmed = key.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() > 8 {
        let prefix: String = trimmed.chars().take(4).collect();
        return format!("{prefix}***");
    }

    "<redacted>".to_string()
}
