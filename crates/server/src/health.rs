use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use foody_db::{ping, DbPool};
use foody_db::repositories::SqlSuggestionQueue;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueueCheck {
    pub status: &'static str,
    pub visible: u64,
    pub in_flight: u64,
    pub dead_lettered: u64,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub queue: QueueCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let queue = queue_check(&state.queue).await;
    let ready = database.status == "ready" && queue.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "foody-server runtime initialized".to_string(),
        },
        database,
        queue,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match ping(pool).await {
        Ok(()) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn queue_check(queue: &SqlSuggestionQueue) -> QueueCheck {
    match queue.stats().await {
        Ok(stats) => QueueCheck {
            status: "ready",
            visible: stats.visible,
            in_flight: stats.in_flight,
            dead_lettered: stats.dead_lettered,
            detail: match stats.oldest_visible_at {
                Some(oldest) => format!("oldest visible message enqueued at {}", oldest.to_rfc3339()),
                None => "no messages waiting".to_string(),
            },
        },
        Err(error) => QueueCheck {
            status: "degraded",
            visible: 0,
            in_flight: 0,
            dead_lettered: 0,
            detail: format!("queue stats failed: {error}"),
        },
    }
}
