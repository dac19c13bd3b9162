//! Task repository with assignment set replacement.

use std::collections::HashMap;

use chrono::NaiveDate;
use opsdesk_shared::types::{PageRequest, Paged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::common::{RefFilter, date_between, fetch_page, search_any};
use super::lookup::{EntityRef, ids, pick, project_refs, user_refs};
use super::resolver::distinct_in_order;
use crate::entities::{
    sea_orm_active_enums::{TaskPriority, TaskStatus},
    task_assignments, tasks,
};

/// Error types for task operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Task not found.
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Task with its references and assignees loaded.
#[derive(Debug, Clone)]
pub struct TaskView {
    /// The task record.
    pub task: tasks::Model,
    /// Owning project.
    pub project: Option<EntityRef>,
    /// Primary assignee.
    pub assignee: Option<EntityRef>,
    /// Users on the assignment list.
    pub assignments: Vec<EntityRef>,
}

/// Input for creating a task. References are already resolved.
#[derive(Debug, Clone)]
pub struct CreateTaskInput {
    /// Owning company.
    pub company_id: i32,
    /// Owning project.
    pub project_id: i32,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Primary assignee.
    pub assignee_id: Option<i32>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Assigned users; `None` creates no assignments.
    pub assignment_user_ids: Option<Vec<i32>>,
}

/// Input for updating a task.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskInput {
    /// Owning project.
    pub project_id: Option<i32>,
    /// Title.
    pub title: Option<String>,
    /// Description.
    pub description: Option<Option<String>>,
    /// Status.
    pub status: Option<TaskStatus>,
    /// Priority.
    pub priority: Option<TaskPriority>,
    /// Primary assignee.
    pub assignee_id: Option<Option<i32>>,
    /// Due date.
    pub due_date: Option<Option<NaiveDate>>,
    /// Replacement assignment set; `None` leaves assignments untouched.
    pub assignment_user_ids: Option<Vec<i32>>,
}

/// Filter options for listing tasks.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// Filter by status.
    pub status: Option<TaskStatus>,
    /// Filter by priority.
    pub priority: Option<TaskPriority>,
    /// Filter by project.
    pub project: RefFilter,
    /// Filter by primary assignee.
    pub assignee: RefFilter,
    /// Due on or after.
    pub from: Option<NaiveDate>,
    /// Due on or before.
    pub to: Option<NaiveDate>,
    /// Substring match on title or description.
    pub search: Option<String>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            project: RefFilter::Any,
            assignee: RefFilter::Any,
            from: None,
            to: None,
            search: None,
        }
    }
}

/// Replaces the assignment set of a task.
///
/// Deletes every existing row for the task, then inserts one row per distinct
/// user. Runs on the caller's connection so it joins the task write's transaction.
///
/// # Errors
///
/// Returns an error if a statement fails; the caller's transaction rolls back.
pub async fn replace_assignments<C: ConnectionTrait>(
    db: &C,
    task_id: i32,
    user_ids: &[i32],
) -> Result<(), DbErr> {
    task_assignments::Entity::delete_many()
        .filter(task_assignments::Column::TaskId.eq(task_id))
        .exec(db)
        .await?;

    let user_ids = distinct_in_order(user_ids);
    if user_ids.is_empty() {
        return Ok(());
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
    let rows = user_ids.into_iter().map(|user_id| task_assignments::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        task_id: Set(task_id),
        user_id: Set(user_id),
        assigned_at: Set(now),
        ..Default::default()
    });
    task_assignments::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Task repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TaskRepository {
    db: DatabaseConnection,
}

impl TaskRepository {
    /// Creates a new task repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a task and its assignments in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; nothing is written in that case.
    pub async fn create(&self, input: CreateTaskInput) -> Result<tasks::Model, DbErr> {
        let txn = self.db.begin().await?;

        let now = chrono::Utc::now().into();
        let task = tasks::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            project_id: Set(input.project_id),
            title: Set(input.title),
            description: Set(input.description),
            status: Set(input.status),
            priority: Set(input.priority),
            assignee_id: Set(input.assignee_id),
            due_date: Set(input.due_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(user_ids) = input.assignment_user_ids {
            replace_assignments(&txn, task.id, &user_ids).await?;
        }

        txn.commit().await?;
        Ok(task)
    }

    /// Finds a task by UUID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<tasks::Model>, DbErr> {
        tasks::Entity::find()
            .filter(tasks::Column::CompanyId.eq(company_id))
            .filter(tasks::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Lists tasks of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<Paged<tasks::Model>, DbErr> {
        let mut cond = Condition::all().add(tasks::Column::CompanyId.eq(company_id));
        if let Some(status) = filter.status {
            cond = cond.add(tasks::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            cond = cond.add(tasks::Column::Priority.eq(priority));
        }
        cond = filter.project.apply(cond, tasks::Column::ProjectId);
        cond = filter.assignee.apply(cond, tasks::Column::AssigneeId);
        cond = date_between(cond, tasks::Column::DueDate, filter.from, filter.to);
        cond = search_any(
            cond,
            &[tasks::Column::Title, tasks::Column::Description],
            filter.search.as_deref(),
        );

        let select = tasks::Entity::find()
            .filter(cond)
            .order_by_desc(tasks::Column::CreatedAt)
            .order_by_desc(tasks::Column::Id);
        fetch_page(select, &self.db, page).await
    }

    /// Loads project, assignee and assignment list for each task.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn with_refs(&self, rows: Vec<tasks::Model>) -> Result<Vec<TaskView>, DbErr> {
        let task_ids: Vec<i32> = rows.iter().map(|t| t.id).collect();
        let assignments = if task_ids.is_empty() {
            Vec::new()
        } else {
            task_assignments::Entity::find()
                .filter(task_assignments::Column::TaskId.is_in(task_ids))
                .order_by_asc(task_assignments::Column::Id)
                .all(&self.db)
                .await?
        };

        let projects = project_refs(&self.db, &ids(rows.iter().map(|t| Some(t.project_id)))).await?;
        let people = user_refs(
            &self.db,
            &ids(rows
                .iter()
                .map(|t| t.assignee_id)
                .chain(assignments.iter().map(|a| Some(a.user_id)))),
        )
        .await?;

        let mut by_task: HashMap<i32, Vec<EntityRef>> = HashMap::new();
        for assignment in &assignments {
            if let Some(user) = people.get(&assignment.user_id) {
                by_task
                    .entry(assignment.task_id)
                    .or_default()
                    .push(user.clone());
            }
        }

        Ok(rows
            .into_iter()
            .map(|task| TaskView {
                project: pick(&projects, Some(task.project_id)),
                assignee: pick(&people, task.assignee_id),
                assignments: by_task.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect())
    }

    /// Loads the references of a single task.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn view(&self, task: tasks::Model) -> Result<TaskView, DbErr> {
        let mut views = self.with_refs(vec![task]).await?;
        views
            .pop()
            .ok_or_else(|| DbErr::Custom("task view lost its row".to_string()))
    }

    /// Applies a partial update and, when supplied, replaces the assignment set,
    /// all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; nothing is written in that case.
    pub async fn update(
        &self,
        task: tasks::Model,
        input: UpdateTaskInput,
    ) -> Result<tasks::Model, DbErr> {
        let txn = self.db.begin().await?;
        let task_id = task.id;
        let mut active: tasks::ActiveModel = task.into();

        if let Some(project_id) = input.project_id {
            active.project_id = Set(project_id);
        }
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(priority) = input.priority {
            active.priority = Set(priority);
        }
        if let Some(assignee_id) = input.assignee_id {
            active.assignee_id = Set(assignee_id);
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(due_date);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let task = active.update(&txn).await?;

        if let Some(user_ids) = input.assignment_user_ids {
            replace_assignments(&txn, task_id, &user_ids).await?;
        }

        txn.commit().await?;
        Ok(task)
    }

    /// Deletes a task and its assignments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the task is not in the company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), TaskError> {
        let task = self
            .find(company_id, uuid)
            .await?
            .ok_or(TaskError::NotFound(uuid))?;
        task.delete(&self.db).await?;
        Ok(())
    }
}
