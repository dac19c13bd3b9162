//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware and role checks
//! - Request extractors
//! - The response envelope and error rendering

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use axum::response::{IntoResponse, Response};
use opsdesk_core::auth::PasswordPolicy;
use opsdesk_shared::config::{AppConfig, PasswordSettings};
use opsdesk_shared::{JwtConfig, JwtService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Argon2 work factor for password writes.
    pub password_policy: PasswordPolicy,
}

impl AppState {
    /// Builds the state from a connection and the loaded configuration.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &AppConfig) -> Self {
        let jwt_service = JwtService::new(JwtConfig {
            secret: config.jwt.secret.clone(),
            expires_in_hours: config.jwt.expires_in_hours,
        });
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            password_policy: password_policy(&config.password),
        }
    }
}

/// Maps the configured work factor onto the hashing policy.
#[must_use]
pub const fn password_policy(settings: &PasswordSettings) -> PasswordPolicy {
    PasswordPolicy {
        memory_kib: settings.memory_kib,
        iterations: settings.iterations,
        parallelism: settings.parallelism,
    }
}

async fn fallback() -> Response {
    ApiError::not_found("Route not found").into_response()
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
