use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use foody_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct ConfigLine {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl ConfigLine {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for line in effective_lines(&config) {
        let source =
            field_source(line.key, line.env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(line.key, &line.value, source));
    }

    lines.join("\n")
}

fn effective_lines(config: &AppConfig) -> Vec<ConfigLine> {
    vec![
        ConfigLine::new("database.url", &config.database.url, &["FOODY_DATABASE_URL"]),
        ConfigLine::new(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["FOODY_DATABASE_MAX_CONNECTIONS"],
        ),
        ConfigLine::new(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["FOODY_DATABASE_TIMEOUT_SECS"],
        ),
        ConfigLine::new(
            "server.bind_address",
            &config.server.bind_address,
            &["FOODY_SERVER_BIND_ADDRESS"],
        ),
        ConfigLine::new("server.port", config.server.port.to_string(), &["FOODY_SERVER_PORT"]),
        ConfigLine::new(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["FOODY_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        ConfigLine::new("nlu.enabled", config.nlu.enabled.to_string(), &["FOODY_NLU_ENABLED"]),
        ConfigLine::new(
            "nlu.base_url",
            config.nlu.base_url.as_deref().unwrap_or("<unset>"),
            &["FOODY_NLU_BASE_URL"],
        ),
        ConfigLine::new("nlu.bot_id", or_unset(&config.nlu.bot_id), &["FOODY_NLU_BOT_ID"]),
        ConfigLine::new(
            "nlu.bot_alias_id",
            or_unset(&config.nlu.bot_alias_id),
            &["FOODY_NLU_BOT_ALIAS_ID"],
        ),
        ConfigLine::new("nlu.locale_id", &config.nlu.locale_id, &["FOODY_NLU_LOCALE_ID"]),
        ConfigLine::new("nlu.api_key", redact_secret(config.nlu.api_key.as_ref()), &["FOODY_NLU_API_KEY"]),
        ConfigLine::new(
            "queue.worker_enabled",
            config.queue.worker_enabled.to_string(),
            &["FOODY_QUEUE_WORKER_ENABLED"],
        ),
        ConfigLine::new(
            "queue.max_messages",
            config.queue.max_messages.to_string(),
            &["FOODY_QUEUE_MAX_MESSAGES"],
        ),
        ConfigLine::new(
            "queue.visibility_timeout_secs",
            config.queue.visibility_timeout_secs.to_string(),
            &["FOODY_QUEUE_VISIBILITY_TIMEOUT_SECS"],
        ),
        ConfigLine::new(
            "queue.wait_time_secs",
            config.queue.wait_time_secs.to_string(),
            &["FOODY_QUEUE_WAIT_TIME_SECS"],
        ),
        ConfigLine::new(
            "queue.max_receive_count",
            config.queue.max_receive_count.to_string(),
            &["FOODY_QUEUE_MAX_RECEIVE_COUNT"],
        ),
        ConfigLine::new("search.base_url", &config.search.base_url, &["FOODY_SEARCH_BASE_URL"]),
        ConfigLine::new("search.index", &config.search.index, &["FOODY_SEARCH_INDEX"]),
        ConfigLine::new(
            "search.username",
            config.search.username.as_deref().unwrap_or("<unset>"),
            &["FOODY_SEARCH_USERNAME"],
        ),
        ConfigLine::new(
            "search.password",
            redact_secret(config.search.password.as_ref()),
            &["FOODY_SEARCH_PASSWORD"],
        ),
        ConfigLine::new(
            "search.max_hits",
            config.search.max_hits.to_string(),
            &["FOODY_SEARCH_MAX_HITS"],
        ),
        ConfigLine::new("mail.provider", format!("{:?}", config.mail.provider), &["FOODY_MAIL_PROVIDER"]),
        ConfigLine::new("mail.sender", &config.mail.sender, &["FOODY_MAIL_SENDER"]),
        ConfigLine::new(
            "mail.base_url",
            config.mail.base_url.as_deref().unwrap_or("<unset>"),
            &["FOODY_MAIL_BASE_URL"],
        ),
        ConfigLine::new("mail.api_key", redact_secret(config.mail.api_key.as_ref()), &["FOODY_MAIL_API_KEY"]),
        ConfigLine::new(
            "dialog.supported_locations",
            config.dialog.supported_locations.join(","),
            &["FOODY_DIALOG_SUPPORTED_LOCATIONS"],
        ),
        ConfigLine::new(
            "dialog.suggestion_count",
            config.dialog.suggestion_count.to_string(),
            &["FOODY_DIALOG_SUGGESTION_COUNT"],
        ),
        ConfigLine::new(
            "logging.level",
            &config.logging.level,
            &["FOODY_LOGGING_LEVEL", "FOODY_LOG_LEVEL"],
        ),
        ConfigLine::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["FOODY_LOGGING_FORMAT", "FOODY_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("foody.toml"), PathBuf::from("config/foody.toml")]
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

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        value
    }
}

fn redact_secret(secret: Option<&SecretString>) -> &'static str {
    match secret {
        Some(value) if value.expose_secret().trim().is_empty() => "<empty>",
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}
