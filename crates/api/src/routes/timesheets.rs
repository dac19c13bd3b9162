//! Timesheet routes.

use axum::{Router, extract::State, response::Response, routing::get};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use opsdesk_core::auth::RoleSet;
use opsdesk_core::reference::{ReferenceError, ReferenceField};
use opsdesk_core::validation::{
    MAX_HOURS, MAX_RATE, RuleViolation, check_at_most, check_non_negative, check_positive,
};
use opsdesk_db::repositories::{
    CreateTimesheetInput, EntityRef, TimesheetError, TimesheetFilter, TimesheetView,
    UpdateTimesheetInput,
};
use opsdesk_db::{Resolver, TimesheetRepository};
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

/// Creates timesheet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/Timesheets", get(list_timesheets).post(create_timesheet))
        .route(
            "/Timesheets/{uuid}",
            get(get_timesheet)
                .put(update_timesheet)
                .delete(delete_timesheet),
        )
}

#[derive(Debug, Serialize)]
struct TimesheetResponse {
    uuid: Uuid,
    date: NaiveDate,
    hours: Decimal,
    description: Option<String>,
    billable: bool,
    cost_rate: Decimal,
    cost_total: Decimal,
    project: Option<EntityRef>,
    task: Option<EntityRef>,
    user: Option<EntityRef>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<TimesheetView> for TimesheetResponse {
    fn from(view: TimesheetView) -> Self {
        let timesheet = view.timesheet;
        Self {
            uuid: timesheet.uuid,
            date: timesheet.date,
            hours: timesheet.hours,
            description: timesheet.description,
            billable: timesheet.billable,
            cost_rate: timesheet.cost_rate,
            cost_total: view.cost_total,
            project: view.project,
            task: view.task,
            user: view.user,
            created_at: timesheet.created_at,
            updated_at: timesheet.updated_at,
        }
    }
}

/// Query parameters for listing timesheets.
#[derive(Debug, Deserialize)]
pub struct TimesheetListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Filter by project.
    pub project_uuid: Option<Uuid>,
    /// Filter by task.
    pub task_uuid: Option<Uuid>,
    /// Filter by user.
    pub user_uuid: Option<Uuid>,
    /// Filter by billable flag.
    pub billable: Option<bool>,
    /// Worked on or after this date.
    pub from: Option<NaiveDate>,
    /// Worked on or before this date.
    pub to: Option<NaiveDate>,
    /// Substring match on the description.
    pub search: Option<String>,
}

/// Request to log time.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTimesheetRequest {
    /// Project worked on.
    pub project_uuid: Uuid,
    /// Task worked on; must belong to the project.
    pub task_uuid: Option<Uuid>,
    /// Who worked; defaults to the caller.
    pub user_uuid: Option<Uuid>,
    /// Day worked; defaults to today.
    pub date: Option<NaiveDate>,
    /// Hours worked.
    pub hours: Decimal,
    /// What was done.
    pub description: Option<String>,
    /// Whether the time is billable; defaults to true.
    pub billable: Option<bool>,
    /// Cost per hour; defaults to the user's hourly rate.
    pub cost_rate: Option<Decimal>,
}

/// Request to change a timesheet entry.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTimesheetRequest {
    /// Project worked on.
    pub project_uuid: Option<Uuid>,
    /// Task worked on; `null` unlinks it.
    #[serde(default, deserialize_with = "nullable")]
    pub task_uuid: Option<Option<Uuid>>,
    /// Who worked.
    pub user_uuid: Option<Uuid>,
    /// Day worked.
    pub date: Option<NaiveDate>,
    /// Hours worked.
    pub hours: Option<Decimal>,
    /// What was done.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Whether the time is billable.
    pub billable: Option<bool>,
    /// Cost per hour.
    pub cost_rate: Option<Decimal>,
}

async fn list_timesheets(
    State(state): State<AppState>,
    auth: AuthUser,
    ListQuery(query): ListQuery<TimesheetListQuery>,
) -> ApiResult<Response> {
    let page = PageRequest::from_query(query.page, query.limit);
    let resolver = Resolver::new((*state.db).clone());
    let filter = TimesheetFilter {
        project: resolver
            .project_filter(auth.company_id, query.project_uuid)
            .await?,
        task: resolver
            .task_filter(auth.company_id, query.task_uuid)
            .await?,
        user: resolver
            .user_filter(auth.company_id, query.user_uuid)
            .await?,
        billable: query.billable,
        from: query.from,
        to: query.to,
        search: query.search,
    };

    let repo = TimesheetRepository::new((*state.db).clone());
    let paged = repo.list(auth.company_id, &filter, page).await?;
    let rows = Paged::new(repo.with_refs(paged.rows).await?, paged.total_count)
        .map(TimesheetResponse::from);
    Ok(response::page("Timesheets", rows, page))
}

async fn get_timesheet(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    let repo = TimesheetRepository::new((*state.db).clone());
    let timesheet = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(TimesheetError::NotFound(uuid))?;
    let view = repo.view(timesheet).await?;
    Ok(response::ok("Timesheet", TimesheetResponse::from(view)))
}

fn check_entry(hours: Option<Decimal>, cost_rate: Option<Decimal>) -> Result<(), RuleViolation> {
    if let Some(hours) = hours {
        check_positive(hours, "hours")?;
        check_at_most(hours, MAX_HOURS, "hours")?;
    }
    if let Some(rate) = cost_rate {
        check_non_negative(rate, "cost_rate")?;
        check_at_most(rate, MAX_RATE, "cost_rate")?;
    }
    Ok(())
}

async fn create_timesheet(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<CreateTimesheetRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::ANY)?;
    check_entry(Some(payload.hours), payload.cost_rate)?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = resolver
        .required_project(auth.company_id, payload.project_uuid)
        .await?;
    let task_id = resolver
        .task_in_project(auth.company_id, payload.task_uuid, project_id)
        .await?;
    let user_uuid = payload.user_uuid.unwrap_or(auth.uuid);
    let user = resolver
        .user(auth.company_id, Some(user_uuid), ReferenceField::User)
        .await?
        .ok_or_else(|| ReferenceError::new(ReferenceField::User))?;
    let cost_rate = payload
        .cost_rate
        .or(user.hourly_rate)
        .unwrap_or(Decimal::ZERO);

    let repo = TimesheetRepository::new((*state.db).clone());
    let timesheet = repo
        .create(CreateTimesheetInput {
            company_id: auth.company_id,
            project_id,
            task_id,
            user_id: user.id,
            date: payload.date.unwrap_or_else(|| Utc::now().date_naive()),
            hours: payload.hours,
            description: payload.description,
            billable: payload.billable.unwrap_or(true),
            cost_rate,
        })
        .await?;

    info!(timesheet_uuid = %timesheet.uuid, actor = %auth.uuid, "Timesheet created");
    let view = repo.view(timesheet).await?;
    Ok(response::created("Timesheet created", TimesheetResponse::from(view)))
}

async fn update_timesheet(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateTimesheetRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::ANY)?;
    check_entry(payload.hours, payload.cost_rate)?;

    let repo = TimesheetRepository::new((*state.db).clone());
    let timesheet = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(TimesheetError::NotFound(uuid))?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = match payload.project_uuid {
        Some(project) => Some(resolver.required_project(auth.company_id, project).await?),
        None => None,
    };
    let effective_project = project_id.unwrap_or(timesheet.project_id);

    let task_id = match payload.task_uuid {
        Some(task) => Some(
            resolver
                .task_in_project(auth.company_id, task, effective_project)
                .await?,
        ),
        None => {
            if let (Some(_), Some(existing)) = (project_id, timesheet.task_id) {
                resolver.check_task_project(existing, effective_project).await?;
            }
            None
        }
    };
    let user_id = match payload.user_uuid {
        Some(user) => resolver
            .user(auth.company_id, Some(user), ReferenceField::User)
            .await?
            .map(|user| user.id),
        None => None,
    };

    let timesheet = repo
        .update(
            timesheet,
            UpdateTimesheetInput {
                project_id,
                task_id,
                user_id,
                date: payload.date,
                hours: payload.hours,
                description: payload.description,
                billable: payload.billable,
                cost_rate: payload.cost_rate,
            },
        )
        .await?;

    info!(timesheet_uuid = %timesheet.uuid, actor = %auth.uuid, "Timesheet updated");
    let view = repo.view(timesheet).await?;
    Ok(response::ok("Timesheet updated", TimesheetResponse::from(view)))
}

async fn delete_timesheet(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::MANAGERS)?;
    TimesheetRepository::new((*state.db).clone())
        .delete(auth.company_id, uuid)
        .await?;
    info!(timesheet_uuid = %uuid, actor = %auth.uuid, "Timesheet deleted");
    Ok(response::deleted("Timesheet deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_reads_decimal_strings_and_numbers() {
        let request: CreateTimesheetRequest = serde_json::from_str(
            r#"{"project_uuid": "7d0f8f3e-64c4-4f8e-8a4a-7e3f6a1f2b10", "hours": "2.5", "cost_rate": 40}"#,
        )
        .unwrap();
        assert_eq!(request.hours, dec!(2.5));
        assert_eq!(request.cost_rate, Some(dec!(40)));
        assert_eq!(request.billable, None);
    }

    #[test]
    fn test_update_can_unlink_task() {
        let request: UpdateTimesheetRequest =
            serde_json::from_str(r#"{"task_uuid": null}"#).unwrap();
        assert_eq!(request.task_uuid, Some(None));
        assert_eq!(request.project_uuid, None);
    }

    #[test]
    fn test_entry_limits_follow_the_columns() {
        assert!(check_entry(Some(dec!(9999.99)), Some(dec!(9999999999.99))).is_ok());
        assert_eq!(check_entry(Some(dec!(10000)), None).unwrap_err().field, "hours");
        assert_eq!(check_entry(Some(dec!(0)), None).unwrap_err().code, "MUST_BE_POSITIVE");
        let err = check_entry(None, Some(dec!(10000000000))).unwrap_err();
        assert_eq!((err.field, err.code), ("cost_rate", "TOO_LARGE"));
        assert!(check_entry(None, None).is_ok());
    }
}
