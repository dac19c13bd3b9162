//! Analytics routes.

use axum::{Router, extract::State, response::Response, routing::get};
use chrono::Utc;
use opsdesk_core::auth::RoleSet;
use opsdesk_db::AnalyticsRepository;
use tracing::debug;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::response;

/// Creates analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/Analytics/dashboard", get(dashboard))
}

/// GET /Analytics/dashboard - Six-month series, KPIs and resource utilization.
async fn dashboard(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Response> {
    auth.require(RoleSet::OFFICE)?;
    let today = Utc::now().date_naive();
    debug!(company_id = auth.company_id, %today, "Building dashboard");

    let dashboard = AnalyticsRepository::new((*state.db).clone())
        .dashboard(auth.company_id, today)
        .await?;
    Ok(response::ok("Dashboard", dashboard))
}
