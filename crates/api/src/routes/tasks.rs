//! Task routes, including the assignment set.

use axum::{Router, extract::State, response::Response, routing::get};
use chrono::{DateTime, FixedOffset, NaiveDate};
use opsdesk_core::auth::RoleSet;
use opsdesk_core::reference::ReferenceField;
use opsdesk_db::entities::sea_orm_active_enums::{TaskPriority, TaskStatus};
use opsdesk_db::repositories::{
    CreateTaskInput, EntityRef, TaskError, TaskFilter, TaskView, UpdateTaskInput,
};
use opsdesk_db::{Resolver, TaskRepository, TimesheetRepository};
use opsdesk_shared::types::{PageRequest, Paged};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{EntityId, ListQuery, ValidJson, nullable};
use crate::middleware::AuthUser;
use crate::response;

/// Creates task routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/Tasks", get(list_tasks).post(create_task))
        .route(
            "/Tasks/{uuid}",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[derive(Debug, Serialize)]
struct TaskResponse {
    uuid: Uuid,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<NaiveDate>,
    project: Option<EntityRef>,
    assignee: Option<EntityRef>,
    assignments: Vec<EntityRef>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<TaskView> for TaskResponse {
    fn from(view: TaskView) -> Self {
        let task = view.task;
        Self {
            uuid: task.uuid,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            project: view.project,
            assignee: view.assignee,
            assignments: view.assignments,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Filter by status.
    pub status: Option<TaskStatus>,
    /// Filter by priority.
    pub priority: Option<TaskPriority>,
    /// Filter by project.
    pub project_uuid: Option<Uuid>,
    /// Filter by assignee.
    pub assignee_uuid: Option<Uuid>,
    /// Due on or after this date.
    pub from: Option<NaiveDate>,
    /// Due on or before this date.
    pub to: Option<NaiveDate>,
    /// Substring match on title or description.
    pub search: Option<String>,
}

/// Request to create a task.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Owning project.
    pub project_uuid: Uuid,
    /// Title.
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Status; defaults to `todo`.
    pub status: Option<TaskStatus>,
    /// Priority; defaults to `medium`.
    pub priority: Option<TaskPriority>,
    /// Primary assignee.
    pub assignee_uuid: Option<Uuid>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Everyone working on the task.
    pub assignment_user_uuids: Option<Vec<Uuid>>,
}

/// Request to change a task.
///
/// `assignment_user_uuids` replaces the whole set when present; `[]` clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// Owning project.
    pub project_uuid: Option<Uuid>,
    /// Title.
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,
    /// Free-text description.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Status.
    pub status: Option<TaskStatus>,
    /// Priority.
    pub priority: Option<TaskPriority>,
    /// Primary assignee.
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_uuid: Option<Option<Uuid>>,
    /// Due date.
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,
    /// Everyone working on the task.
    pub assignment_user_uuids: Option<Vec<Uuid>>,
}

async fn resolve_assignments(
    resolver: &Resolver,
    company_id: i32,
    uuids: Option<Vec<Uuid>>,
) -> ApiResult<Option<Vec<i32>>> {
    match uuids {
        Some(uuids) => Ok(Some(resolver.users(company_id, &uuids).await?)),
        None => Ok(None),
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    ListQuery(query): ListQuery<TaskListQuery>,
) -> ApiResult<Response> {
    let page = PageRequest::from_query(query.page, query.limit);
    let resolver = Resolver::new((*state.db).clone());
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        project: resolver
            .project_filter(auth.company_id, query.project_uuid)
            .await?,
        assignee: resolver
            .user_filter(auth.company_id, query.assignee_uuid)
            .await?,
        from: query.from,
        to: query.to,
        search: query.search,
    };

    let repo = TaskRepository::new((*state.db).clone());
    let paged = repo.list(auth.company_id, &filter, page).await?;
    let rows =
        Paged::new(repo.with_refs(paged.rows).await?, paged.total_count).map(TaskResponse::from);
    Ok(response::page("Tasks", rows, page))
}

async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    let repo = TaskRepository::new((*state.db).clone());
    let task = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(TaskError::NotFound(uuid))?;
    let view = repo.view(task).await?;
    Ok(response::ok("Task", TaskResponse::from(view)))
}

async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<CreateTaskRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::DELIVERY)?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = resolver
        .required_project(auth.company_id, payload.project_uuid)
        .await?;
    let assignee_id = resolver
        .user(auth.company_id, payload.assignee_uuid, ReferenceField::Assignee)
        .await?
        .map(|user| user.id);
    let assignment_user_ids =
        resolve_assignments(&resolver, auth.company_id, payload.assignment_user_uuids).await?;

    let repo = TaskRepository::new((*state.db).clone());
    let task = repo
        .create(CreateTaskInput {
            company_id: auth.company_id,
            project_id,
            title: payload.title,
            description: payload.description,
            status: payload.status.unwrap_or(TaskStatus::Todo),
            priority: payload.priority.unwrap_or(TaskPriority::Medium),
            assignee_id,
            due_date: payload.due_date,
            assignment_user_ids,
        })
        .await?;

    info!(task_uuid = %task.uuid, actor = %auth.uuid, "Task created");
    let view = repo.view(task).await?;
    Ok(response::created("Task created", TaskResponse::from(view)))
}

/// A task with logged time stays in its project, so its timesheets keep
/// pointing at a task of their own project.
fn check_project_move(logged_timesheets: u64) -> ApiResult<()> {
    if logged_timesheets == 0 {
        Ok(())
    } else {
        Err(ApiError::field(
            "project_uuid",
            "TASK_HAS_TIMESHEETS",
            "Task has logged timesheets and cannot move to another project",
        ))
    }
}

async fn update_task(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::DELIVERY)?;
    let repo = TaskRepository::new((*state.db).clone());
    let task = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(TaskError::NotFound(uuid))?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = match payload.project_uuid {
        Some(project) => Some(resolver.required_project(auth.company_id, project).await?),
        None => None,
    };
    if project_id.is_some_and(|id| id != task.project_id) {
        let logged = TimesheetRepository::new((*state.db).clone())
            .count_for_task(auth.company_id, task.id)
            .await?;
        check_project_move(logged)?;
    }
    let assignee_id = match payload.assignee_uuid {
        Some(assignee) => Some(
            resolver
                .user(auth.company_id, assignee, ReferenceField::Assignee)
                .await?
                .map(|user| user.id),
        ),
        None => None,
    };
    let assignment_user_ids =
        resolve_assignments(&resolver, auth.company_id, payload.assignment_user_uuids).await?;

    let task = repo
        .update(
            task,
            UpdateTaskInput {
                project_id,
                title: payload.title,
                description: payload.description,
                status: payload.status,
                priority: payload.priority,
                assignee_id,
                due_date: payload.due_date,
                assignment_user_ids,
            },
        )
        .await?;

    info!(task_uuid = %task.uuid, actor = %auth.uuid, "Task updated");
    let view = repo.view(task).await?;
    Ok(response::ok("Task updated", TaskResponse::from(view)))
}

async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::MANAGERS)?;
    TaskRepository::new((*state.db).clone())
        .delete(auth.company_id, uuid)
        .await?;
    info!(task_uuid = %uuid, actor = %auth.uuid, "Task deleted");
    Ok(response::deleted("Task deleted"))
}
