//! Contact routes for clients and vendors.

use axum::{Router, extract::State, response::Response, routing::get};
use chrono::{DateTime, FixedOffset};
use opsdesk_core::auth::RoleSet;
use opsdesk_db::ContactRepository;
use opsdesk_db::entities::{contacts, sea_orm_active_enums::ContactType};
use opsdesk_db::repositories::{
    ContactError, ContactFilter, CreateContactInput, UpdateContactInput,
};
use opsdesk_shared::types::PageRequest;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{EntityId, ListQuery, ValidJson, nullable};
use crate::middleware::AuthUser;
use crate::response;

/// Creates contact routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/Contacts", get(list_contacts).post(create_contact))
        .route(
            "/Contacts/{uuid}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[derive(Debug, Serialize)]
struct ContactResponse {
    uuid: Uuid,
    name: String,
    #[serde(rename = "type")]
    contact_type: ContactType,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<contacts::Model> for ContactResponse {
    fn from(contact: contacts::Model) -> Self {
        Self {
            uuid: contact.uuid,
            name: contact.name,
            contact_type: contact.contact_type,
            email: contact.email,
            phone: contact.phone,
            address: contact.address,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

/// Query parameters for listing contacts.
#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Filter by contact type.
    #[serde(rename = "type")]
    pub contact_type: Option<ContactType>,
    /// Substring match on name, email, or phone.
    pub search: Option<String>,
}

/// Request to create a contact.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    /// Name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Client, vendor, or both.
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    /// Email address.
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Phone number.
    #[validate(length(max = 50, message = "Phone is too long"))]
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Request to change a contact. `null` clears an optional field.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContactRequest {
    /// Name.
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    /// Client, vendor, or both.
    #[serde(default, rename = "type")]
    pub contact_type: Option<ContactType>,
    /// Email address.
    #[serde(default, deserialize_with = "nullable")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<Option<String>>,
    /// Phone number.
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 50, message = "Phone is too long"))]
    pub phone: Option<Option<String>>,
    /// Postal address.
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
}

async fn list_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
    ListQuery(query): ListQuery<ContactListQuery>,
) -> ApiResult<Response> {
    let page = PageRequest::from_query(query.page, query.limit);
    let filter = ContactFilter {
        contact_type: query.contact_type,
        search: query.search,
    };
    let rows = ContactRepository::new((*state.db).clone())
        .list(auth.company_id, &filter, page)
        .await?
        .map(ContactResponse::from);
    Ok(response::page("Contacts", rows, page))
}

async fn get_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    let contact = ContactRepository::new((*state.db).clone())
        .find(auth.company_id, uuid)
        .await?
        .ok_or(ContactError::NotFound(uuid))?;
    Ok(response::ok("Contact", ContactResponse::from(contact)))
}

async fn create_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<CreateContactRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::OFFICE)?;
    let contact = ContactRepository::new((*state.db).clone())
        .create(CreateContactInput {
            company_id: auth.company_id,
            name: payload.name,
            contact_type: payload.contact_type,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
        })
        .await?;

    info!(contact_uuid = %contact.uuid, actor = %auth.uuid, "Contact created");
    Ok(response::created("Contact created", ContactResponse::from(contact)))
}

async fn update_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateContactRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::OFFICE)?;
    let repo = ContactRepository::new((*state.db).clone());
    let contact = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(ContactError::NotFound(uuid))?;

    let contact = repo
        .update(
            contact,
            UpdateContactInput {
                name: payload.name,
                contact_type: payload.contact_type,
                email: payload.email,
                phone: payload.phone,
                address: payload.address,
            },
        )
        .await?;

    info!(contact_uuid = %contact.uuid, actor = %auth.uuid, "Contact updated");
    Ok(response::ok("Contact updated", ContactResponse::from(contact)))
}

async fn delete_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::FINANCE)?;
    ContactRepository::new((*state.db).clone())
        .delete(auth.company_id, uuid)
        .await?;
    info!(contact_uuid = %uuid, actor = %auth.uuid, "Contact deleted");
    Ok(response::deleted("Contact deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_contact_reads_type_key() {
        let request: CreateContactRequest =
            serde_json::from_str(r#"{"name": "Acme", "type": "vendor", "email": "ap@acme.io"}"#)
                .unwrap();
        assert_eq!(request.contact_type, ContactType::Vendor);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_contact_rejects_bad_email() {
        let request: UpdateContactRequest =
            serde_json::from_str(r#"{"email": "nope", "phone": null}"#).unwrap();
        assert_eq!(request.phone, Some(None));
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
