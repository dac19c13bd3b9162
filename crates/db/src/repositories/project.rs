//! Project repository.

use chrono::NaiveDate;
use opsdesk_shared::types::{PageRequest, Paged};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::{RefFilter, date_between, fetch_page, search_any};
use super::lookup::{EntityRef, contact_refs, ids, pick, user_refs};
use crate::entities::{projects, sea_orm_active_enums::ProjectStatus};

/// Error types for project operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Project not found.
    #[error("Project not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Project with its references loaded.
#[derive(Debug, Clone)]
pub struct ProjectView {
    /// The project record.
    pub project: projects::Model,
    /// Client contact.
    pub client: Option<EntityRef>,
    /// Managing user.
    pub manager: Option<EntityRef>,
}

/// Input for creating a project. References are already resolved.
#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    /// Owning company.
    pub company_id: i32,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Client contact id.
    pub client_id: Option<i32>,
    /// Manager user id.
    pub manager_id: Option<i32>,
    /// Status.
    pub status: ProjectStatus,
    /// Start date.
    pub start_date: Option<NaiveDate>,
    /// End date.
    pub end_date: Option<NaiveDate>,
    /// Budget.
    pub budget: Option<Decimal>,
}

/// Input for updating a project.
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    /// Name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<Option<String>>,
    /// Client contact id.
    pub client_id: Option<Option<i32>>,
    /// Manager user id.
    pub manager_id: Option<Option<i32>>,
    /// Status.
    pub status: Option<ProjectStatus>,
    /// Start date.
    pub start_date: Option<Option<NaiveDate>>,
    /// End date.
    pub end_date: Option<Option<NaiveDate>>,
    /// Budget.
    pub budget: Option<Option<Decimal>>,
}

/// Filter options for listing projects.
#[derive(Debug, Clone)]
pub struct ProjectFilter {
    /// Filter by status.
    pub status: Option<ProjectStatus>,
    /// Filter by client.
    pub client: RefFilter,
    /// Filter by manager.
    pub manager: RefFilter,
    /// Start date on or after.
    pub from: Option<NaiveDate>,
    /// Start date on or before.
    pub to: Option<NaiveDate>,
    /// Substring match on name or description.
    pub search: Option<String>,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self {
            status: None,
            client: RefFilter::Any,
            manager: RefFilter::Any,
            from: None,
            to: None,
            search: None,
        }
    }
}

/// Project repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: DatabaseConnection,
}

impl ProjectRepository {
    /// Creates a new project repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateProjectInput) -> Result<projects::Model, DbErr> {
        let now = chrono::Utc::now().into();
        projects::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            name: Set(input.name),
            description: Set(input.description),
            client_id: Set(input.client_id),
            manager_id: Set(input.manager_id),
            status: Set(input.status),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            budget: Set(input.budget),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Finds a project by UUID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<projects::Model>, DbErr> {
        projects::Entity::find()
            .filter(projects::Column::CompanyId.eq(company_id))
            .filter(projects::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Lists projects of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> Result<Paged<projects::Model>, DbErr> {
        let mut cond = Condition::all().add(projects::Column::CompanyId.eq(company_id));
        if let Some(status) = filter.status {
            cond = cond.add(projects::Column::Status.eq(status));
        }
        cond = filter.client.apply(cond, projects::Column::ClientId);
        cond = filter.manager.apply(cond, projects::Column::ManagerId);
        cond = date_between(cond, projects::Column::StartDate, filter.from, filter.to);
        cond = search_any(
            cond,
            &[projects::Column::Name, projects::Column::Description],
            filter.search.as_deref(),
        );

        let select = projects::Entity::find()
            .filter(cond)
            .order_by_desc(projects::Column::CreatedAt)
            .order_by_desc(projects::Column::Id);
        fetch_page(select, &self.db, page).await
    }

    /// Loads the client and manager of each project.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn with_refs(&self, rows: Vec<projects::Model>) -> Result<Vec<ProjectView>, DbErr> {
        let clients = contact_refs(&self.db, &ids(rows.iter().map(|p| p.client_id))).await?;
        let managers = user_refs(&self.db, &ids(rows.iter().map(|p| p.manager_id))).await?;

        Ok(rows
            .into_iter()
            .map(|project| ProjectView {
                client: pick(&clients, project.client_id),
                manager: pick(&managers, project.manager_id),
                project,
            })
            .collect())
    }

    /// Loads the references of a single project.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn view(&self, project: projects::Model) -> Result<ProjectView, DbErr> {
        let mut views = self.with_refs(vec![project]).await?;
        views
            .pop()
            .ok_or_else(|| DbErr::Custom("project view lost its row".to_string()))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(
        &self,
        project: projects::Model,
        input: UpdateProjectInput,
    ) -> Result<projects::Model, DbErr> {
        let mut active: projects::ActiveModel = project.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(client_id) = input.client_id {
            active.client_id = Set(client_id);
        }
        if let Some(manager_id) = input.manager_id {
            active.manager_id = Set(manager_id);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(budget) = input.budget {
            active.budget = Set(budget);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await
    }

    /// Deletes a project together with its tasks, timesheets and expenses.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the project is not in the company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), ProjectError> {
        let project = self
            .find(company_id, uuid)
            .await?
            .ok_or(ProjectError::NotFound(uuid))?;
        project.delete(&self.db).await?;
        Ok(())
    }
}
