//! User repository for database operations.
//!
//! Every write that carries a password goes through
//! [`ensure_hashed`](opsdesk_core::auth::ensure_hashed) first.

use opsdesk_core::auth::{PasswordError, PasswordPolicy, ensure_hashed};
use opsdesk_shared::types::{PageRequest, Paged};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::common::{fetch_page, search_any};
use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Email already registered.
    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Password could not be hashed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Owning company.
    pub company_id: i32,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Plaintext password or an existing Argon2 hash.
    pub password: String,
    /// Role within the company.
    pub role: UserRole,
    /// Hourly cost rate.
    pub hourly_rate: Option<Decimal>,
}

/// Input for updating a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Display name.
    pub name: Option<String>,
    /// Login email.
    pub email: Option<String>,
    /// New password; hashed unless already a hash.
    pub password: Option<String>,
    /// Role.
    pub role: Option<UserRole>,
    /// Hourly cost rate.
    pub hourly_rate: Option<Option<Decimal>>,
}

/// Filter options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Filter by role.
    pub role: Option<UserRole>,
    /// Substring match on name or email.
    pub search: Option<String>,
}

/// Normalizes an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn map_unique(err: DbErr, email: &str) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::EmailTaken(email.to_string()),
        _ => UserError::Database(err),
    }
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
    policy: PasswordPolicy,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: PasswordPolicy) -> Self {
        Self { db, policy }
    }

    /// Finds a user by email, across all companies.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
    }

    /// Finds a user by public UUID, across all companies.
    ///
    /// Only the authentication layer should call this.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Finds a user by public UUID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` on a duplicate email, or an error if hashing or the
    /// insert fails.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        self.create_with(&self.db, input).await
    }

    /// Creates a user on the given connection, used inside signup's transaction.
    pub(crate) async fn create_with<C: ConnectionTrait>(
        &self,
        db: &C,
        input: CreateUserInput,
    ) -> Result<users::Model, UserError> {
        let email = normalize_email(&input.email);
        let password_hash = ensure_hashed(&input.password, &self.policy)?;

        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            name: Set(input.name),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            role: Set(input.role),
            hourly_rate: Set(input.hourly_rate),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        user.insert(db).await.map_err(|e| map_unique(e, &email))
    }

    /// Lists users of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Paged<users::Model>, DbErr> {
        let mut cond = Condition::all().add(users::Column::CompanyId.eq(company_id));
        if let Some(role) = filter.role {
            cond = cond.add(users::Column::Role.eq(role));
        }
        cond = search_any(
            cond,
            &[users::Column::Name, users::Column::Email],
            filter.search.as_deref(),
        );

        let select = users::Entity::find()
            .filter(cond)
            .order_by_asc(users::Column::Name)
            .order_by_asc(users::Column::Id);
        fetch_page(select, &self.db, page).await
    }

    /// Applies a partial update.
    ///
    /// The password is rehashed only when a new one is supplied.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` on a duplicate email, or an error if hashing or the
    /// update fails.
    pub async fn update(
        &self,
        user: users::Model,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let mut active: users::ActiveModel = user.into();
        let mut email_for_error = String::new();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            email_for_error = normalize_email(&email);
            active.email = Set(email_for_error.clone());
        }
        if let Some(password) = input.password {
            active.password_hash = Set(ensure_hashed(&password, &self.policy)?);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(hourly_rate) = input.hourly_rate {
            active.hourly_rate = Set(hourly_rate);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active
            .update(&self.db)
            .await
            .map_err(|e| map_unique(e, &email_for_error))
    }

    /// Deletes a user of a company.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the user is not in the company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), UserError> {
        let user = self
            .find(company_id, uuid)
            .await?
            .ok_or(UserError::NotFound(uuid))?;
        user.delete(&self.db).await?;
        Ok(())
    }
}
