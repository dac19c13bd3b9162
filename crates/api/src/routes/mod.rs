//! API route definitions.

use axum::{Router, middleware};
use opsdesk_core::documents::DocumentKind;

use crate::{AppState, middleware::auth_middleware};

pub mod analytics;
pub mod auth;
pub mod companies;
pub mod contacts;
pub mod documents;
pub mod expenses;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod timesheets;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let mut protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(companies::routes())
        .merge(contacts::routes())
        .merge(projects::routes())
        .merge(tasks::routes())
        .merge(timesheets::routes())
        .merge(expenses::routes())
        .merge(analytics::routes());
    for kind in DocumentKind::ALL {
        protected_routes = protected_routes.merge(documents::routes(kind));
    }
    let protected_routes =
        protected_routes.layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::public_routes())
        .merge(protected_routes)
}
