use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialog::validation::{is_valid_email, DEFAULT_LOCATION};
use crate::worker::{WorkerSettings, DEFAULT_SUGGESTION_COUNT};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub nlu: NluConfig,
    pub queue: QueueConfig,
    pub search: SearchConfig,
    pub mail: MailConfig,
    pub dialog: DialogConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Connection to the conversational engine used by the chat front door.
#[derive(Clone, Debug)]
pub struct NluConfig {
    pub enabled: bool,
    pub base_url: Option<String>,
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub worker_enabled: bool,
    pub max_messages: u32,
    pub visibility_timeout_secs: u64,
    pub wait_time_secs: u64,
    pub max_receive_count: u32,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub base_url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub max_hits: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub sender: String,
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DialogConfig {
    pub supported_locations: Vec<String>,
    pub suggestion_count: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailProvider {
    Log,
    Http,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub worker_enabled: Option<bool>,
    pub mail_provider: Option<MailProvider>,
    pub search_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://foody.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            nlu: NluConfig {
                enabled: false,
                base_url: None,
                bot_id: String::new(),
                bot_alias_id: String::new(),
                locale_id: "en_US".to_string(),
                api_key: None,
                timeout_secs: 10,
            },
            queue: QueueConfig {
                worker_enabled: true,
                max_messages: 10,
                visibility_timeout_secs: 40,
                wait_time_secs: 10,
                max_receive_count: 5,
            },
            search: SearchConfig {
                base_url: "http://localhost:9200".to_string(),
                index: "restaurants".to_string(),
                username: None,
                password: None,
                max_hits: 1000,
                timeout_secs: 10,
            },
            mail: MailConfig {
                provider: MailProvider::Log,
                sender: "concierge@foody.example".to_string(),
                base_url: None,
                api_key: None,
                timeout_secs: 10,
            },
            dialog: DialogConfig {
                supported_locations: vec![DEFAULT_LOCATION.to_string()],
                suggestion_count: DEFAULT_SUGGESTION_COUNT,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for MailProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::Validation(format!(
                "unsupported mail provider `{other}` (expected log|http)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("foody.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            max_messages: self.queue.max_messages,
            visibility_timeout_secs: self.queue.visibility_timeout_secs,
            suggestion_count: self.dialog.suggestion_count,
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(nlu) = patch.nlu {
            if let Some(enabled) = nlu.enabled {
                self.nlu.enabled = enabled;
            }
            if let Some(base_url) = nlu.base_url {
                self.nlu.base_url = Some(base_url);
            }
            if let Some(bot_id) = nlu.bot_id {
                self.nlu.bot_id = bot_id;
            }
            if let Some(bot_alias_id) = nlu.bot_alias_id {
                self.nlu.bot_alias_id = bot_alias_id;
            }
            if let Some(locale_id) = nlu.locale_id {
                self.nlu.locale_id = locale_id;
            }
            if let Some(nlu_api_key_value) = nlu.api_key {
                self.nlu.api_key = Some(secret_value(nlu_api_key_value));
            }
            if let Some(timeout_secs) = nlu.timeout_secs {
                self.nlu.timeout_secs = timeout_secs;
            }
        }

        if let Some(queue) = patch.queue {
            if let Some(worker_enabled) = queue.worker_enabled {
                self.queue.worker_enabled = worker_enabled;
            }
            if let Some(max_messages) = queue.max_messages {
                self.queue.max_messages = max_messages;
            }
            if let Some(visibility_timeout_secs) = queue.visibility_timeout_secs {
                self.queue.visibility_timeout_secs = visibility_timeout_secs;
            }
            if let Some(wait_time_secs) = queue.wait_time_secs {
                self.queue.wait_time_secs = wait_time_secs;
            }
            if let Some(max_receive_count) = queue.max_receive_count {
                self.queue.max_receive_count = max_receive_count;
            }
        }

        if let Some(search) = patch.search {
            if let Some(base_url) = search.base_url {
                self.search.base_url = base_url;
            }
            if let Some(index) = search.index {
                self.search.index = index;
            }
            if let Some(username) = search.username {
                self.search.username = Some(username);
            }
            if let Some(search_password_value) = search.password {
                self.search.password = Some(secret_value(search_password_value));
            }
            if let Some(max_hits) = search.max_hits {
                self.search.max_hits = max_hits;
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
        }

        if let Some(mail) = patch.mail {
            if let Some(provider) = mail.provider {
                self.mail.provider = provider;
            }
            if let Some(sender) = mail.sender {
                self.mail.sender = sender;
            }
            if let Some(base_url) = mail.base_url {
                self.mail.base_url = Some(base_url);
            }
            if let Some(mail_api_key_value) = mail.api_key {
                self.mail.api_key = Some(secret_value(mail_api_key_value));
            }
            if let Some(timeout_secs) = mail.timeout_secs {
                self.mail.timeout_secs = timeout_secs;
            }
        }

        if let Some(dialog) = patch.dialog {
            if let Some(supported_locations) = dialog.supported_locations {
                self.dialog.supported_locations = supported_locations;
            }
            if let Some(suggestion_count) = dialog.suggestion_count {
                self.dialog.suggestion_count = suggestion_count;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FOODY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FOODY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("FOODY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FOODY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("FOODY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FOODY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FOODY_SERVER_PORT") {
            self.server.port = parse_u16("FOODY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FOODY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("FOODY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("FOODY_NLU_ENABLED") {
            self.nlu.enabled = parse_bool("FOODY_NLU_ENABLED", &value)?;
        }
        if let Some(value) = read_env("FOODY_NLU_BASE_URL") {
            self.nlu.base_url = Some(value);
        }
        if let Some(value) = read_env("FOODY_NLU_BOT_ID") {
            self.nlu.bot_id = value;
        }
        if let Some(value) = read_env("FOODY_NLU_BOT_ALIAS_ID") {
            self.nlu.bot_alias_id = value;
        }
        if let Some(value) = read_env("FOODY_NLU_LOCALE_ID") {
            self.nlu.locale_id = value;
        }
        if let Some(value) = read_env("FOODY_NLU_API_KEY") {
            self.nlu.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FOODY_NLU_TIMEOUT_SECS") {
            self.nlu.timeout_secs = parse_u64("FOODY_NLU_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FOODY_QUEUE_WORKER_ENABLED") {
            self.queue.worker_enabled = parse_bool("FOODY_QUEUE_WORKER_ENABLED", &value)?;
        }
        if let Some(value) = read_env("FOODY_QUEUE_MAX_MESSAGES") {
            self.queue.max_messages = parse_u32("FOODY_QUEUE_MAX_MESSAGES", &value)?;
        }
        if let Some(value) = read_env("FOODY_QUEUE_VISIBILITY_TIMEOUT_SECS") {
            self.queue.visibility_timeout_secs =
                parse_u64("FOODY_QUEUE_VISIBILITY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FOODY_QUEUE_WAIT_TIME_SECS") {
            self.queue.wait_time_secs = parse_u64("FOODY_QUEUE_WAIT_TIME_SECS", &value)?;
        }
        if let Some(value) = read_env("FOODY_QUEUE_MAX_RECEIVE_COUNT") {
            self.queue.max_receive_count = parse_u32("FOODY_QUEUE_MAX_RECEIVE_COUNT", &value)?;
        }

        if let Some(value) = read_env("FOODY_SEARCH_BASE_URL") {
            self.search.base_url = value;
        }
        if let Some(value) = read_env("FOODY_SEARCH_INDEX") {
            self.search.index = value;
        }
        if let Some(value) = read_env("FOODY_SEARCH_USERNAME") {
            self.search.username = Some(value);
        }
        if let Some(value) = read_env("FOODY_SEARCH_PASSWORD") {
            self.search.password = Some(secret_value(value));
        }
        if let Some(value) = read_env("FOODY_SEARCH_MAX_HITS") {
            self.search.max_hits = parse_u32("FOODY_SEARCH_MAX_HITS", &value)?;
        }
        if let Some(value) = read_env("FOODY_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("FOODY_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FOODY_MAIL_PROVIDER") {
            self.mail.provider = value.parse()?;
        }
        if let Some(value) = read_env("FOODY_MAIL_SENDER") {
            self.mail.sender = value;
        }
        if let Some(value) = read_env("FOODY_MAIL_BASE_URL") {
            self.mail.base_url = Some(value);
        }
        if let Some(value) = read_env("FOODY_MAIL_API_KEY") {
            self.mail.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FOODY_MAIL_TIMEOUT_SECS") {
            self.mail.timeout_secs = parse_u64("FOODY_MAIL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FOODY_DIALOG_SUPPORTED_LOCATIONS") {
            self.dialog.supported_locations = parse_list(&value);
        }
        if let Some(value) = read_env("FOODY_DIALOG_SUGGESTION_COUNT") {
            self.dialog.suggestion_count = parse_usize("FOODY_DIALOG_SUGGESTION_COUNT", &value)?;
        }

        let log_level = read_env("FOODY_LOGGING_LEVEL").or_else(|| read_env("FOODY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("FOODY_LOGGING_FORMAT").or_else(|| read_env("FOODY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(worker_enabled) = overrides.worker_enabled {
            self.queue.worker_enabled = worker_enabled;
        }
        if let Some(mail_provider) = overrides.mail_provider {
            self.mail.provider = mail_provider;
        }
        if let Some(search_base_url) = overrides.search_base_url {
            self.search.base_url = search_base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_nlu(&self.nlu)?;
        validate_queue(&self.queue)?;
        validate_search(&self.search)?;
        validate_mail(&self.mail)?;
        validate_dialog(&self.dialog)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("foody.toml"), PathBuf::from("config/foody.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_timeout(field: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    validate_timeout("database.timeout_secs", database.timeout_secs)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_nlu(nlu: &NluConfig) -> Result<(), ConfigError> {
    validate_timeout("nlu.timeout_secs", nlu.timeout_secs)?;
    if !nlu.enabled {
        return Ok(());
    }

    match nlu.base_url.as_deref().map(str::trim) {
        None | Some("") => {
            return Err(ConfigError::Validation(
                "nlu.base_url is required when nlu.enabled is true".to_string(),
            ))
        }
        Some(url) if !is_http_url(url) => {
            return Err(ConfigError::Validation(
                "nlu.base_url must start with http:// or https://".to_string(),
            ))
        }
        Some(_) => {}
    }

    if nlu.bot_id.trim().is_empty() || nlu.bot_alias_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "nlu.bot_id and nlu.bot_alias_id are required when nlu.enabled is true".to_string(),
        ));
    }

    if nlu.locale_id.trim().is_empty() {
        return Err(ConfigError::Validation("nlu.locale_id must not be empty".to_string()));
    }

    Ok(())
}

fn validate_queue(queue: &QueueConfig) -> Result<(), ConfigError> {
    if !(1..=10).contains(&queue.max_messages) {
        return Err(ConfigError::Validation(
            "queue.max_messages must be in range 1..=10".to_string(),
        ));
    }

    if queue.visibility_timeout_secs == 0 || queue.visibility_timeout_secs > 43_200 {
        return Err(ConfigError::Validation(
            "queue.visibility_timeout_secs must be in range 1..=43200".to_string(),
        ));
    }

    if queue.wait_time_secs > 20 {
        return Err(ConfigError::Validation(
            "queue.wait_time_secs must be in range 0..=20".to_string(),
        ));
    }

    if queue.max_receive_count == 0 {
        return Err(ConfigError::Validation(
            "queue.max_receive_count must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if !is_http_url(search.base_url.trim()) {
        return Err(ConfigError::Validation(
            "search.base_url must start with http:// or https://".to_string(),
        ));
    }

    if search.index.trim().is_empty() {
        return Err(ConfigError::Validation("search.index must not be empty".to_string()));
    }

    if search.max_hits == 0 {
        return Err(ConfigError::Validation(
            "search.max_hits must be greater than zero".to_string(),
        ));
    }

    if search.password.is_some() && search.username.is_none() {
        return Err(ConfigError::Validation(
            "search.password is set but search.username is missing".to_string(),
        ));
    }

    validate_timeout("search.timeout_secs", search.timeout_secs)
}

fn validate_mail(mail: &MailConfig) -> Result<(), ConfigError> {
    validate_timeout("mail.timeout_secs", mail.timeout_secs)?;

    if !is_valid_email(&mail.sender) {
        return Err(ConfigError::Validation(format!(
            "mail.sender `{}` is not a valid email address",
            mail.sender
        )));
    }

    if mail.provider == MailProvider::Http {
        let base_url = mail.base_url.as_deref().map(str::trim).unwrap_or_default();
        if !is_http_url(base_url) {
            return Err(ConfigError::Validation(
                "mail.base_url must be an http(s) URL for the http provider".to_string(),
            ));
        }

        let missing_key = mail
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_key {
            return Err(ConfigError::Validation(
                "mail.api_key is required for the http provider".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_dialog(dialog: &DialogConfig) -> Result<(), ConfigError> {
    if dialog.supported_locations.iter().all(|location| location.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "dialog.supported_locations must name at least one location".to_string(),
        ));
    }

    if dialog.suggestion_count == 0 {
        return Err(ConfigError::Validation(
            "dialog.suggestion_count must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    nlu: Option<NluPatch>,
    queue: Option<QueuePatch>,
    search: Option<SearchPatch>,
    mail: Option<MailPatch>,
    dialog: Option<DialogPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NluPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    bot_id: Option<String>,
    bot_alias_id: Option<String>,
    locale_id: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct QueuePatch {
    worker_enabled: Option<bool>,
    max_messages: Option<u32>,
    visibility_timeout_secs: Option<u64>,
    wait_time_secs: Option<u64>,
    max_receive_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    base_url: Option<String>,
    index: Option<String>,
    username: Option<String>,
    password: Option<String>,
    max_hits: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MailPatch {
    provider: Option<MailProvider>,
    sender: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DialogPatch {
    supported_locations: Option<Vec<String>>,
    suggestion_count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
