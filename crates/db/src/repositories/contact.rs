//! Contact repository for clients and vendors.

use opsdesk_shared::types::{PageRequest, Paged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::{fetch_page, search_any};
use crate::entities::{contacts, sea_orm_active_enums::ContactType};

/// Error types for contact operations.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    /// Contact not found.
    #[error("Contact not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a contact.
#[derive(Debug, Clone)]
pub struct CreateContactInput {
    /// Owning company.
    pub company_id: i32,
    /// Name.
    pub name: String,
    /// Client, vendor or both.
    pub contact_type: ContactType,
    /// Email.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Input for updating a contact.
#[derive(Debug, Clone, Default)]
pub struct UpdateContactInput {
    /// Name.
    pub name: Option<String>,
    /// Client, vendor or both.
    pub contact_type: Option<ContactType>,
    /// Email.
    pub email: Option<Option<String>>,
    /// Phone.
    pub phone: Option<Option<String>>,
    /// Postal address.
    pub address: Option<Option<String>>,
}

/// Filter options for listing contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    /// Filter by type.
    pub contact_type: Option<ContactType>,
    /// Substring match on name, email or phone.
    pub search: Option<String>,
}

/// Contact repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: DatabaseConnection,
}

impl ContactRepository {
    /// Creates a new contact repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateContactInput) -> Result<contacts::Model, DbErr> {
        let now = chrono::Utc::now().into();
        contacts::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            name: Set(input.name),
            contact_type: Set(input.contact_type),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Finds a contact by UUID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<contacts::Model>, DbErr> {
        contacts::Entity::find()
            .filter(contacts::Column::CompanyId.eq(company_id))
            .filter(contacts::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Lists contacts of a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        filter: &ContactFilter,
        page: PageRequest,
    ) -> Result<Paged<contacts::Model>, DbErr> {
        let mut cond = Condition::all().add(contacts::Column::CompanyId.eq(company_id));
        if let Some(contact_type) = filter.contact_type {
            cond = cond.add(contacts::Column::ContactType.eq(contact_type));
        }
        cond = search_any(
            cond,
            &[
                contacts::Column::Name,
                contacts::Column::Email,
                contacts::Column::Phone,
            ],
            filter.search.as_deref(),
        );

        let select = contacts::Entity::find()
            .filter(cond)
            .order_by_asc(contacts::Column::Name)
            .order_by_asc(contacts::Column::Id);
        fetch_page(select, &self.db, page).await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(
        &self,
        contact: contacts::Model,
        input: UpdateContactInput,
    ) -> Result<contacts::Model, DbErr> {
        let mut active: contacts::ActiveModel = contact.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(contact_type) = input.contact_type {
            active.contact_type = Set(contact_type);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await
    }

    /// Deletes a contact; references to it are cleared by the store.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the contact is not in the company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), ContactError> {
        let contact = self
            .find(company_id, uuid)
            .await?
            .ok_or(ContactError::NotFound(uuid))?;
        contact.delete(&self.db).await?;
        Ok(())
    }
}
