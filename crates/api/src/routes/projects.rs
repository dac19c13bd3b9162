//! Project routes.

use axum::{Router, extract::State, response::Response, routing::get};
use chrono::{DateTime, FixedOffset, NaiveDate};
use opsdesk_core::auth::RoleSet;
use opsdesk_core::contact::CounterpartSide;
use opsdesk_core::validation::{
    MAX_AMOUNT, RuleViolation, check_at_most, check_date_range, check_non_negative,
};
use opsdesk_db::entities::sea_orm_active_enums::ProjectStatus;
use opsdesk_db::repositories::{
    CreateProjectInput, EntityRef, ProjectError, ProjectFilter, ProjectView, UpdateProjectInput,
};
use opsdesk_db::{ProjectRepository, Resolver};
use opsdesk_shared::types::{PageRequest, Paged};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{EntityId, ListQuery, ValidJson, nullable};
use crate::middleware::AuthUser;
use crate::response;

/// Creates project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/Projects", get(list_projects).post(create_project))
        .route(
            "/Projects/{uuid}",
            get(get_project).put(update_project).delete(delete_project),
        )
}

#[derive(Debug, Serialize)]
struct ProjectResponse {
    uuid: Uuid,
    name: String,
    description: Option<String>,
    status: ProjectStatus,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    budget: Option<Decimal>,
    client: Option<EntityRef>,
    manager: Option<EntityRef>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<ProjectView> for ProjectResponse {
    fn from(view: ProjectView) -> Self {
        let project = view.project;
        Self {
            uuid: project.uuid,
            name: project.name,
            description: project.description,
            status: project.status,
            start_date: project.start_date,
            end_date: project.end_date,
            budget: project.budget,
            client: view.client,
            manager: view.manager,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Query parameters for listing projects.
#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Filter by status.
    pub status: Option<ProjectStatus>,
    /// Filter by client.
    pub client_uuid: Option<Uuid>,
    /// Filter by manager.
    pub manager_uuid: Option<Uuid>,
    /// Projects starting on or after this date.
    pub from: Option<NaiveDate>,
    /// Projects starting on or before this date.
    pub to: Option<NaiveDate>,
    /// Substring match on name or description.
    pub search: Option<String>,
}

/// Request to create a project.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Client contact.
    pub client_uuid: Option<Uuid>,
    /// Managing user.
    pub manager_uuid: Option<Uuid>,
    /// Status; defaults to `planned`.
    pub status: Option<ProjectStatus>,
    /// Start date.
    pub start_date: Option<NaiveDate>,
    /// End date.
    pub end_date: Option<NaiveDate>,
    /// Budget.
    pub budget: Option<Decimal>,
}

/// Request to change a project. `null` clears an optional field.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// Name.
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    /// Free-text description.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Client contact.
    #[serde(default, deserialize_with = "nullable")]
    pub client_uuid: Option<Option<Uuid>>,
    /// Managing user.
    #[serde(default, deserialize_with = "nullable")]
    pub manager_uuid: Option<Option<Uuid>>,
    /// Status.
    pub status: Option<ProjectStatus>,
    /// Start date.
    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    /// End date.
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    /// Budget.
    #[serde(default, deserialize_with = "nullable")]
    pub budget: Option<Option<Decimal>>,
}

async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    ListQuery(query): ListQuery<ProjectListQuery>,
) -> ApiResult<Response> {
    let page = PageRequest::from_query(query.page, query.limit);
    let resolver = Resolver::new((*state.db).clone());
    let filter = ProjectFilter {
        status: query.status,
        client: resolver
            .contact_filter(auth.company_id, query.client_uuid)
            .await?,
        manager: resolver
            .user_filter(auth.company_id, query.manager_uuid)
            .await?,
        from: query.from,
        to: query.to,
        search: query.search,
    };

    let repo = ProjectRepository::new((*state.db).clone());
    let paged = repo.list(auth.company_id, &filter, page).await?;
    let rows = Paged::new(repo.with_refs(paged.rows).await?, paged.total_count)
        .map(ProjectResponse::from);
    Ok(response::page("Projects", rows, page))
}

async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    let repo = ProjectRepository::new((*state.db).clone());
    let project = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(ProjectError::NotFound(uuid))?;
    let view = repo.view(project).await?;
    Ok(response::ok("Project", ProjectResponse::from(view)))
}

fn check_budget(budget: Option<Decimal>) -> Result<(), RuleViolation> {
    if let Some(budget) = budget {
        check_non_negative(budget, "budget")?;
        check_at_most(budget, MAX_AMOUNT, "budget")?;
    }
    Ok(())
}

async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<CreateProjectRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::MANAGERS)?;
    check_date_range(payload.start_date, payload.end_date, "end_date")?;
    check_budget(payload.budget)?;

    let resolver = Resolver::new((*state.db).clone());
    let client_id = resolver
        .counterpart(auth.company_id, payload.client_uuid, CounterpartSide::Sales)
        .await?;
    let manager_id = resolver
        .manager(auth.company_id, payload.manager_uuid)
        .await?;

    let repo = ProjectRepository::new((*state.db).clone());
    let project = repo
        .create(CreateProjectInput {
            company_id: auth.company_id,
            name: payload.name,
            description: payload.description,
            client_id,
            manager_id,
            status: payload.status.unwrap_or(ProjectStatus::Planned),
            start_date: payload.start_date,
            end_date: payload.end_date,
            budget: payload.budget,
        })
        .await?;

    info!(project_uuid = %project.uuid, actor = %auth.uuid, "Project created");
    let view = repo.view(project).await?;
    Ok(response::created("Project created", ProjectResponse::from(view)))
}

async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateProjectRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::MANAGERS)?;
    let repo = ProjectRepository::new((*state.db).clone());
    let project = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(ProjectError::NotFound(uuid))?;

    let start = payload.start_date.unwrap_or(project.start_date);
    let end = payload.end_date.unwrap_or(project.end_date);
    check_date_range(start, end, "end_date")?;
    check_budget(payload.budget.flatten())?;

    let resolver = Resolver::new((*state.db).clone());
    let client_id = match payload.client_uuid {
        Some(client) => Some(
            resolver
                .counterpart(auth.company_id, client, CounterpartSide::Sales)
                .await?,
        ),
        None => None,
    };
    let manager_id = match payload.manager_uuid {
        Some(manager) => Some(resolver.manager(auth.company_id, manager).await?),
        None => None,
    };

    let project = repo
        .update(
            project,
            UpdateProjectInput {
                name: payload.name,
                description: payload.description,
                client_id,
                manager_id,
                status: payload.status,
                start_date: payload.start_date,
                end_date: payload.end_date,
                budget: payload.budget,
            },
        )
        .await?;

    info!(project_uuid = %project.uuid, actor = %auth.uuid, "Project updated");
    let view = repo.view(project).await?;
    Ok(response::ok("Project updated", ProjectResponse::from(view)))
}

async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    ProjectRepository::new((*state.db).clone())
        .delete(auth.company_id, uuid)
        .await?;
    info!(project_uuid = %uuid, actor = %auth.uuid, "Project deleted");
    Ok(response::deleted("Project deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let request: UpdateProjectRequest =
            serde_json::from_str(r#"{"client_uuid": null, "status": "on_hold"}"#).unwrap();
        assert_eq!(request.client_uuid, Some(None));
        assert_eq!(request.manager_uuid, None);
        assert_eq!(request.status, Some(ProjectStatus::OnHold));
    }

    #[test]
    fn test_create_requires_name() {
        let request: CreateProjectRequest = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_budget_must_fit_the_column() {
        use rust_decimal_macros::dec;

        assert!(check_budget(None).is_ok());
        assert!(check_budget(Some(dec!(999999999999.99))).is_ok());
        let err = check_budget(Some(dec!(1000000000000))).unwrap_err();
        assert_eq!((err.field, err.code), ("budget", "TOO_LARGE"));
        assert!(check_budget(Some(dec!(-1))).is_err());
    }
}
