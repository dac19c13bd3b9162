//! Health check endpoints.

use axum::{Router, extract::State, response::Response, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::response;

/// Health check payload.
#[derive(Serialize)]
pub struct HealthReport {
    /// `healthy` when the database answers, `degraded` otherwise.
    pub state: &'static str,
    /// Service version.
    pub version: &'static str,
    /// `up` or `down`.
    pub database: &'static str,
}

/// Health check handler. Answers 200 even when the database is down.
async fn health_check(State(state): State<AppState>) -> Response {
    let database_up = state.db.ping().await.is_ok();
    let report = HealthReport {
        state: if database_up { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if database_up { "up" } else { "down" },
    };
    let message = if database_up {
        "Service is healthy"
    } else {
        "Database is unreachable"
    };
    response::ok(message, report)
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
