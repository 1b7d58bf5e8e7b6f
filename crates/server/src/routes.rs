use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use foody_core::errors::InterfaceError;
use foody_core::IntentDispatcher;
use foody_db::repositories::SqlSuggestionQueue;
use foody_db::DbPool;

use crate::chat::{self, NluClient};
use crate::{health, lex};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<IntentDispatcher>,
    pub nlu: Arc<dyn NluClient>,
    pub db_pool: DbPool,
    pub queue: Arc<SqlSuggestionQueue>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/lex/fulfillment", post(lex::fulfillment))
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

/// HTTP rendering of an `InterfaceError`.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Only caller mistakes echo the underlying message back.
        let detail = match &self.0 {
            InterfaceError::BadRequest { message, .. } => message.clone(),
            _ => self.0.user_message().to_string(),
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            detail,
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
