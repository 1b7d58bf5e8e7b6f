use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::warn;

use foody_core::errors::{ApplicationError, InterfaceError};
use foody_core::{LexEvent, LexResponse};

use crate::routes::{ApiError, AppState};

/// Code-hook webhook called by the NLU engine for every dialog and
/// fulfillment turn.
pub async fn fulfillment(
    State(state): State<AppState>,
    payload: Result<Json<LexEvent>, JsonRejection>,
) -> Result<Json<LexResponse>, ApiError> {
    let Json(event) = payload.map_err(|rejection| {
        warn!(
            event_name = "lex.request.rejected",
            error = %rejection.body_text(),
            "fulfillment payload did not decode"
        );
        ApiError(InterfaceError::BadRequest {
            message: rejection.body_text(),
            correlation_id: "unassigned".to_string(),
        })
    })?;

    let session_id = event.session_id.clone();
    state
        .dispatcher
        .dispatch(event)
        .await
        .map(Json)
        .map_err(|error| ApiError(ApplicationError::from(error).into_interface(session_id)))
}
