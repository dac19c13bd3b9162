//! Company routes. A caller only ever sees their own company.

use axum::{Router, extract::State, response::Response, routing::get};
use chrono::{DateTime, FixedOffset};
use opsdesk_core::auth::RoleSet;
use opsdesk_db::CompanyRepository;
use opsdesk_db::entities::companies;
use opsdesk_db::repositories::CompanyError;
use opsdesk_shared::types::PageRequest;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{EntityId, ListQuery, ValidJson};
use crate::middleware::AuthUser;
use crate::response;

/// Creates company routes. Tenants are created by signup, so there is no POST.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/Companies", get(list_companies))
        .route(
            "/Companies/{uuid}",
            get(get_company).put(update_company).delete(delete_company),
        )
}

#[derive(Debug, Serialize)]
struct CompanyResponse {
    uuid: Uuid,
    name: String,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<companies::Model> for CompanyResponse {
    fn from(company: companies::Model) -> Self {
        Self {
            uuid: company.uuid,
            name: company.name,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

/// Query parameters for listing companies.
#[derive(Debug, Deserialize)]
pub struct CompanyListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Substring match on the name.
    pub search: Option<String>,
}

/// Request to rename a company.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    /// New name.
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
}

async fn list_companies(
    State(state): State<AppState>,
    auth: AuthUser,
    ListQuery(query): ListQuery<CompanyListQuery>,
) -> ApiResult<Response> {
    let page = PageRequest::from_query(query.page, query.limit);
    let rows = CompanyRepository::new((*state.db).clone())
        .list(auth.company_id, query.search.as_deref(), page)
        .await?
        .map(CompanyResponse::from);
    Ok(response::page("Companies", rows, page))
}

async fn get_company(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    let company = CompanyRepository::new((*state.db).clone())
        .find(auth.company_id, uuid)
        .await?
        .ok_or(CompanyError::NotFound(uuid))?;
    Ok(response::ok("Company", CompanyResponse::from(company)))
}

async fn update_company(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateCompanyRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    let repo = CompanyRepository::new((*state.db).clone());
    let company = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(CompanyError::NotFound(uuid))?;

    let company = repo.update(company, payload.name).await?;
    info!(company_uuid = %company.uuid, actor = %auth.uuid, "Company updated");
    Ok(response::ok("Company updated", CompanyResponse::from(company)))
}

async fn delete_company(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    CompanyRepository::new((*state.db).clone())
        .delete(auth.company_id, uuid)
        .await?;
    info!(company_uuid = %uuid, actor = %auth.uuid, "Company deleted");
    Ok(response::deleted("Company deleted"))
}
