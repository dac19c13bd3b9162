//! Expense repository.

use chrono::NaiveDate;
use opsdesk_shared::types::{PageRequest, Paged};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::{RefFilter, date_between, fetch_page, search_any};
use super::lookup::{EntityRef, ids, pick, project_refs, user_refs};
use crate::entities::{expenses, sea_orm_active_enums::DocumentStatus};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found.
    #[error("Expense not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Expense with its references loaded.
#[derive(Debug, Clone)]
pub struct ExpenseView {
    /// The expense record.
    pub expense: expenses::Model,
    /// Project charged.
    pub project: Option<EntityRef>,
    /// Who spent it.
    pub user: Option<EntityRef>,
}

/// Input for creating an expense. References are already resolved.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Owning company.
    pub company_id: i32,
    /// Project charged.
    pub project_id: i32,
    /// Who spent it.
    pub user_id: Option<i32>,
    /// What it was for.
    pub description: String,
    /// Amount.
    pub amount: Decimal,
    /// Day spent.
    pub date: NaiveDate,
    /// Billable to the client.
    pub billable: bool,
    /// Approval status.
    pub status: DocumentStatus,
    /// Link to the receipt.
    pub receipt_url: Option<String>,
}

/// Input for updating an expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// Project charged.
    pub project_id: Option<i32>,
    /// Who spent it.
    pub user_id: Option<Option<i32>>,
    /// What it was for.
    pub description: Option<String>,
    /// Amount.
    pub amount: Option<Decimal>,
    /// Day spent.
    pub date: Option<NaiveDate>,
    /// Billable flag.
    pub billable: Option<bool>,
    /// Approval status.
    pub status: Option<DocumentStatus>,
    /// Link to the receipt.
    pub receipt_url: Option<Option<String>>,
}

/// Filter options for listing expenses.
#[derive(Debug, Clone)]
pub struct ExpenseFilter {
    /// Filter by status.
    pub status: Option<DocumentStatus>,
    /// Filter by project.
    pub project: RefFilter,
    /// Filter by user.
    pub user: RefFilter,
    /// Filter by billable flag.
    pub billable: Option<bool>,
    /// Spent on or after.
    pub from: Option<NaiveDate>,
    /// Spent on or before.
    pub to: Option<NaiveDate>,
    /// Substring match on description.
    pub search: Option<String>,
}

impl Default for ExpenseFilter {
    fn default() -> Self {
        Self {
            status: None,
            project: RefFilter::Any,
            user: RefFilter::Any,
            billable: None,
            from: None,
            to: None,
            search: None,
        }
    }
}

/// Expense repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateExpenseInput) -> Result<expenses::Model, DbErr> {
        let now = chrono::Utc::now().into();
        expenses::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            project_id: Set(input.project_id),
            user_id: Set(input.user_id),
            description: Set(input.description),
            amount: Set(input.amount),
            date: Set(input.date),
            billable: Set(input.billable),
            status: Set(input.status),
            receipt_url: Set(input.receipt_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Finds an expense by UUID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<expenses::Model>, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .filter(expenses::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Lists expenses of a company, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<Paged<expenses::Model>, DbErr> {
        let mut cond = Condition::all().add(expenses::Column::CompanyId.eq(company_id));
        if let Some(status) = filter.status {
            cond = cond.add(expenses::Column::Status.eq(status));
        }
        cond = filter.project.apply(cond, expenses::Column::ProjectId);
        cond = filter.user.apply(cond, expenses::Column::UserId);
        if let Some(billable) = filter.billable {
            cond = cond.add(expenses::Column::Billable.eq(billable));
        }
        cond = date_between(cond, expenses::Column::Date, filter.from, filter.to);
        cond = search_any(
            cond,
            &[expenses::Column::Description],
            filter.search.as_deref(),
        );

        let select = expenses::Entity::find()
            .filter(cond)
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::Id);
        fetch_page(select, &self.db, page).await
    }

    /// Loads project and user for each expense.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn with_refs(&self, rows: Vec<expenses::Model>) -> Result<Vec<ExpenseView>, DbErr> {
        let projects = project_refs(&self.db, &ids(rows.iter().map(|e| Some(e.project_id)))).await?;
        let users = user_refs(&self.db, &ids(rows.iter().map(|e| e.user_id))).await?;

        Ok(rows
            .into_iter()
            .map(|expense| ExpenseView {
                project: pick(&projects, Some(expense.project_id)),
                user: pick(&users, expense.user_id),
                expense,
            })
            .collect())
    }

    /// Loads the references of a single expense.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn view(&self, expense: expenses::Model) -> Result<ExpenseView, DbErr> {
        let mut views = self.with_refs(vec![expense]).await?;
        views
            .pop()
            .ok_or_else(|| DbErr::Custom("expense view lost its row".to_string()))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(
        &self,
        expense: expenses::Model,
        input: UpdateExpenseInput,
    ) -> Result<expenses::Model, DbErr> {
        let mut active: expenses::ActiveModel = expense.into();

        if let Some(project_id) = input.project_id {
            active.project_id = Set(project_id);
        }
        if let Some(user_id) = input.user_id {
            active.user_id = Set(user_id);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(billable) = input.billable {
            active.billable = Set(billable);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(receipt_url) = input.receipt_url {
            active.receipt_url = Set(receipt_url);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await
    }

    /// Deletes an expense.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the expense is not in the company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), ExpenseError> {
        let expense = self
            .find(company_id, uuid)
            .await?
            .ok_or(ExpenseError::NotFound(uuid))?;
        expense.delete(&self.db).await?;
        Ok(())
    }
}
