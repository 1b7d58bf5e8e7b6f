//! Chat front door: relays the user's text to the NLU engine and reshapes
//! the engine's reply messages for the web client.

use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use foody_core::config::NluConfig;
use foody_core::errors::{ApplicationError, InterfaceError};

use crate::routes::{ApiError, AppState};

/// One message returned by the NLU engine.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NluMessage {
    pub content_type: String,
    #[serde(default)]
    pub content: String,
}

#[async_trait]
pub trait NluClient: Send + Sync {
    async fn recognize_text(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Vec<NluMessage>, ApplicationError>;
}

#[derive(Debug, Deserialize)]
struct RecognizeTextResponse {
    #[serde(default)]
    messages: Vec<NluMessage>,
}

/// `RecognizeText`-shaped HTTP client.
pub struct HttpNluClient {
    client: Client,
    base_url: Url,
    bot_id: String,
    bot_alias_id: String,
    locale_id: String,
    api_key: Option<SecretString>,
}

impl HttpNluClient {
    pub fn from_config(config: &NluConfig) -> Result<Self, ApplicationError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            ApplicationError::Configuration("nlu.base_url is required when nlu is enabled".into())
        })?;
        let base_url = Url::parse(base_url).map_err(|error| {
            ApplicationError::Configuration(format!("nlu.base_url `{base_url}` is invalid: {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApplicationError::Configuration(format!(
                "nlu.base_url `{base_url}` cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| ApplicationError::Configuration(format!("nlu client: {error}")))?;

        Ok(Self {
            client,
            base_url,
            bot_id: config.bot_id.clone(),
            bot_alias_id: config.bot_alias_id.clone(),
            locale_id: config.locale_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Every path parameter is pushed as one escaped segment.
    pub fn recognize_url(&self, session_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "bots",
                self.bot_id.as_str(),
                "botAliases",
                self.bot_alias_id.as_str(),
                "botLocales",
                self.locale_id.as_str(),
                "sessions",
                session_id,
                "text",
            ]);
        }
        url
    }
}

#[async_trait]
impl NluClient for HttpNluClient {
    async fn recognize_text(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Vec<NluMessage>, ApplicationError> {
        let mut request = self.client.post(self.recognize_url(session_id)).json(&json!({ "text": text }));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| ApplicationError::Integration(format!("nlu request: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::Integration(format!("nlu engine returned status {status}")));
        }

        let parsed: RecognizeTextResponse = response
            .json()
            .await
            .map_err(|error| ApplicationError::Integration(format!("nlu response: {error}")))?;
        Ok(parsed.messages)
    }
}

/// Session ids accepted by the NLU engine: 2 to 100 of `[0-9A-Za-z._:-]`,
/// and not made of dots alone.
pub fn is_valid_session_id(session_id: &str) -> bool {
    (2..=100).contains(&session_id.len())
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'))
        && !session_id.chars().all(|c| c == '.')
}

/// Stand-in used when `nlu.enabled` is false.
pub struct DisabledNluClient;

#[async_trait]
impl NluClient for DisabledNluClient {
    async fn recognize_text(
        &self,
        _session_id: &str,
        _text: &str,
    ) -> Result<Vec<NluMessage>, ApplicationError> {
        Err(ApplicationError::Integration("nlu engine is not configured".to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatText {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatMessage {
    Unstructured { unstructured: ChatText },
    Structured { structured: ChatText },
}

impl ChatMessage {
    pub fn text(&self) -> &str {
        match self {
            Self::Unstructured { unstructured } => &unstructured.text,
            Self::Structured { structured } => &structured.text,
        }
    }
}

impl From<NluMessage> for ChatMessage {
    fn from(message: NluMessage) -> Self {
        let text = ChatText { text: message.content };
        if message.content_type == "PlainText" {
            Self::Unstructured { unstructured: text }
        } else {
            Self::Structured { structured: text }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub status_code: u16,
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError(InterfaceError::BadRequest {
            message: rejection.body_text(),
            correlation_id: "chat".to_string(),
        })
    })?;

    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if !is_valid_session_id(&session_id) {
        warn!(event_name = "chat.session.rejected", "chat request carries an invalid session id");
        return Err(ApiError(InterfaceError::BadRequest {
            message: "sessionId must be 2 to 100 characters of [0-9A-Za-z._:-]".to_string(),
            correlation_id: "chat".to_string(),
        }));
    }

    let Some(first) = request.messages.first() else {
        return Err(ApiError(InterfaceError::BadRequest {
            message: "chat request carries no messages".to_string(),
            correlation_id: session_id,
        }));
    };

    let replies = state.nlu.recognize_text(&session_id, first.text()).await.map_err(|error| {
        warn!(
            event_name = "chat.nlu.failed",
            session_id = %session_id,
            error = %error,
            "nlu engine call failed"
        );
        ApiError(error.into_interface(session_id.clone()))
    })?;

    info!(
        event_name = "chat.message.relayed",
        session_id = %session_id,
        reply_count = replies.len(),
        "chat message relayed to nlu engine"
    );

    Ok(Json(ChatResponse {
        status_code: 200,
        session_id,
        messages: replies.into_iter().map(ChatMessage::from).collect(),
    }))
}
