//! Timesheet repository.

use chrono::NaiveDate;
use opsdesk_shared::types::{PageRequest, Paged};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::{RefFilter, date_between, fetch_page, search_any};
use super::lookup::{EntityRef, ids, pick, project_refs, task_refs, user_refs};
use crate::entities::timesheets;

/// Error types for timesheet operations.
#[derive(Debug, thiserror::Error)]
pub enum TimesheetError {
    /// Timesheet not found.
    #[error("Timesheet not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Timesheet with its references loaded.
#[derive(Debug, Clone)]
pub struct TimesheetView {
    /// The timesheet record.
    pub timesheet: timesheets::Model,
    /// Project worked on.
    pub project: Option<EntityRef>,
    /// Task worked on.
    pub task: Option<EntityRef>,
    /// Who worked.
    pub user: Option<EntityRef>,
    /// `hours * cost_rate`.
    pub cost_total: Decimal,
}

/// Input for creating a timesheet. References are already resolved.
#[derive(Debug, Clone)]
pub struct CreateTimesheetInput {
    /// Owning company.
    pub company_id: i32,
    /// Project worked on.
    pub project_id: i32,
    /// Task worked on, within the project.
    pub task_id: Option<i32>,
    /// Who worked.
    pub user_id: i32,
    /// Day worked.
    pub date: NaiveDate,
    /// Hours, strictly positive.
    pub hours: Decimal,
    /// Notes.
    pub description: Option<String>,
    /// Billable to the client.
    pub billable: bool,
    /// Cost per hour.
    pub cost_rate: Decimal,
}

/// Input for updating a timesheet.
#[derive(Debug, Clone, Default)]
pub struct UpdateTimesheetInput {
    /// Project worked on.
    pub project_id: Option<i32>,
    /// Task worked on.
    pub task_id: Option<Option<i32>>,
    /// Who worked.
    pub user_id: Option<i32>,
    /// Day worked.
    pub date: Option<NaiveDate>,
    /// Hours.
    pub hours: Option<Decimal>,
    /// Notes.
    pub description: Option<Option<String>>,
    /// Billable flag.
    pub billable: Option<bool>,
    /// Cost per hour.
    pub cost_rate: Option<Decimal>,
}

/// Filter options for listing timesheets.
#[derive(Debug, Clone)]
pub struct TimesheetFilter {
    /// Filter by project.
    pub project: RefFilter,
    /// Filter by task.
    pub task: RefFilter,
    /// Filter by user.
    pub user: RefFilter,
    /// Filter by billable flag.
    pub billable: Option<bool>,
    /// Worked on or after.
    pub from: Option<NaiveDate>,
    /// Worked on or before.
    pub to: Option<NaiveDate>,
    /// Substring match on description.
    pub search: Option<String>,
}

impl Default for TimesheetFilter {
    fn default() -> Self {
        Self {
            project: RefFilter::Any,
            task: RefFilter::Any,
            user: RefFilter::Any,
            billable: None,
            from: None,
            to: None,
            search: None,
        }
    }
}

/// Timesheet repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TimesheetRepository {
    db: DatabaseConnection,
}

impl TimesheetRepository {
    /// Creates a new timesheet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a timesheet entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateTimesheetInput) -> Result<timesheets::Model, DbErr> {
        let now = chrono::Utc::now().into();
        timesheets::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            project_id: Set(input.project_id),
            task_id: Set(input.task_id),
            user_id: Set(input.user_id),
            date: Set(input.date),
            hours: Set(input.hours),
            description: Set(input.description),
            billable: Set(input.billable),
            cost_rate: Set(input.cost_rate),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Finds a timesheet by UUID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<timesheets::Model>, DbErr> {
        timesheets::Entity::find()
            .filter(timesheets::Column::CompanyId.eq(company_id))
            .filter(timesheets::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Counts the timesheets logged against a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_for_task(&self, company_id: i32, task_id: i32) -> Result<u64, DbErr> {
        timesheets::Entity::find()
            .filter(timesheets::Column::CompanyId.eq(company_id))
            .filter(timesheets::Column::TaskId.eq(task_id))
            .count(&self.db)
            .await
    }

    /// Lists timesheets of a company, newest day first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        filter: &TimesheetFilter,
        page: PageRequest,
    ) -> Result<Paged<timesheets::Model>, DbErr> {
        let mut cond = Condition::all().add(timesheets::Column::CompanyId.eq(company_id));
        cond = filter.project.apply(cond, timesheets::Column::ProjectId);
        cond = filter.task.apply(cond, timesheets::Column::TaskId);
        cond = filter.user.apply(cond, timesheets::Column::UserId);
        if let Some(billable) = filter.billable {
            cond = cond.add(timesheets::Column::Billable.eq(billable));
        }
        cond = date_between(cond, timesheets::Column::Date, filter.from, filter.to);
        cond = search_any(
            cond,
            &[timesheets::Column::Description],
            filter.search.as_deref(),
        );

        let select = timesheets::Entity::find()
            .filter(cond)
            .order_by_desc(timesheets::Column::Date)
            .order_by_desc(timesheets::Column::Id);
        fetch_page(select, &self.db, page).await
    }

    /// Loads project, task and user for each entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn with_refs(
        &self,
        rows: Vec<timesheets::Model>,
    ) -> Result<Vec<TimesheetView>, DbErr> {
        let projects = project_refs(&self.db, &ids(rows.iter().map(|t| Some(t.project_id)))).await?;
        let tasks = task_refs(&self.db, &ids(rows.iter().map(|t| t.task_id))).await?;
        let users = user_refs(&self.db, &ids(rows.iter().map(|t| Some(t.user_id)))).await?;

        Ok(rows
            .into_iter()
            .map(|timesheet| TimesheetView {
                project: pick(&projects, Some(timesheet.project_id)),
                task: pick(&tasks, timesheet.task_id),
                user: pick(&users, Some(timesheet.user_id)),
                cost_total: timesheet.cost_total(),
                timesheet,
            })
            .collect())
    }

    /// Loads the references of a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn view(&self, timesheet: timesheets::Model) -> Result<TimesheetView, DbErr> {
        let mut views = self.with_refs(vec![timesheet]).await?;
        views
            .pop()
            .ok_or_else(|| DbErr::Custom("timesheet view lost its row".to_string()))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(
        &self,
        timesheet: timesheets::Model,
        input: UpdateTimesheetInput,
    ) -> Result<timesheets::Model, DbErr> {
        let mut active: timesheets::ActiveModel = timesheet.into();

        if let Some(project_id) = input.project_id {
            active.project_id = Set(project_id);
        }
        if let Some(task_id) = input.task_id {
            active.task_id = Set(task_id);
        }
        if let Some(user_id) = input.user_id {
            active.user_id = Set(user_id);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(hours) = input.hours {
            active.hours = Set(hours);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(billable) = input.billable {
            active.billable = Set(billable);
        }
        if let Some(cost_rate) = input.cost_rate {
            active.cost_rate = Set(cost_rate);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await
    }

    /// Deletes a timesheet entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the entry is not in the company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), TimesheetError> {
        let timesheet = self
            .find(company_id, uuid)
            .await?
            .ok_or(TimesheetError::NotFound(uuid))?;
        timesheet.delete(&self.db).await?;
        Ok(())
    }
}
