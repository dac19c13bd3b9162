//! Company (tenant) repository.

use opsdesk_shared::types::{PageRequest, Paged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::common::{fetch_page, search_any};
use super::user::{CreateUserInput, UserError, UserRepository};
use crate::entities::{companies, sea_orm_active_enums::UserRole, users};

/// Error types for company operations.
#[derive(Debug, thiserror::Error)]
pub enum CompanyError {
    /// Company not found in the caller's tenant.
    #[error("Company not found: {0}")]
    NotFound(Uuid),

    /// The admin user could not be created.
    #[error(transparent)]
    User(#[from] UserError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for signing up a new tenant.
#[derive(Debug, Clone)]
pub struct SignupInput {
    /// Company name.
    pub company_name: String,
    /// Admin display name.
    pub name: String,
    /// Admin email.
    pub email: String,
    /// Admin password.
    pub password: String,
}

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company and its first admin in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `User(EmailTaken)` if the email is registered, or a database error.
    /// Nothing is written on failure.
    pub async fn signup(
        &self,
        users_repo: &UserRepository,
        input: SignupInput,
    ) -> Result<(companies::Model, users::Model), CompanyError> {
        let txn = self.db.begin().await?;

        let now = chrono::Utc::now().into();
        let company = companies::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(input.company_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let admin = users_repo
            .create_with(
                &txn,
                CreateUserInput {
                    company_id: company.id,
                    name: input.name,
                    email: input.email,
                    password: input.password,
                    role: UserRole::Admin,
                    hourly_rate: None,
                },
            )
            .await?;

        txn.commit().await?;

        Ok((company, admin))
    }

    /// Finds a company by internal id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds the caller's company by UUID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(company_id)
            .filter(companies::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Lists the companies visible to the caller: only their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paged<companies::Model>, DbErr> {
        let cond = search_any(
            Condition::all().add(companies::Column::Id.eq(company_id)),
            &[companies::Column::Name],
            search,
        );
        let select = companies::Entity::find()
            .filter(cond)
            .order_by_asc(companies::Column::Id);
        fetch_page(select, &self.db, page).await
    }

    /// Renames a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update(
        &self,
        company: companies::Model,
        name: Option<String>,
    ) -> Result<companies::Model, DbErr> {
        let mut active: companies::ActiveModel = company.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await
    }

    /// Deletes the caller's company and, by cascade, everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the UUID is not the caller's company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), CompanyError> {
        let company = self
            .find(company_id, uuid)
            .await?
            .ok_or(CompanyError::NotFound(uuid))?;
        company.delete(&self.db).await?;
        Ok(())
    }
}
