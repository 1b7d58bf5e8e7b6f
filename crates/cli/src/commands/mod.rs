pub mod config;
pub mod doctor;
pub mod migrate;
pub mod redrive;
pub mod seed;

use foody_core::config::{AppConfig, LoadOptions};
use foody_db::{connect_with_settings, DbPool};
use serde::Serialize;

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
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Failure triple threaded through a command's async body:
/// `(error_class, message, exit_code)`.
pub(crate) type CommandFailure = (&'static str, String, u8);

/// Loads configuration and a single-threaded runtime, the shared preamble of
/// every database-touching command.
pub(crate) fn prepare(
    command: &str,
) -> Result<(AppConfig, tokio::runtime::Runtime), CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        })?;

    Ok((config, runtime))
}

pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, CommandFailure> {
    connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::CommandResult;

    #[test]
    fn outcomes_serialize_as_single_json_line() {
        let ok = CommandResult::success("seed", "loaded");
        assert_eq!(ok.exit_code, 0);
        assert_eq!(
            ok.output,
            r#"{"command":"seed","status":"ok","error_class":null,"message":"loaded"}"#
        );

        let failed = CommandResult::failure("migrate", "migration", "boom \"quoted\"", 5);
        assert_eq!(failed.exit_code, 5);
        let payload: serde_json::Value = serde_json::from_str(&failed.output).expect("json");
        assert_eq!(payload["error_class"], "migration");
        assert_eq!(payload["message"], "boom \"quoted\"");
    }
}
