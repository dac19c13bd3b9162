//! Routes shared by the four financial document kinds.
//!
//! One set of handlers serves sales orders, invoices, purchase orders and
//! vendor bills; the kind travels as a request extension set per router.

use axum::{Extension, Router, extract::State, response::Response, routing::get};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use opsdesk_core::auth::RoleSet;
use opsdesk_core::contact::CounterpartSide;
use opsdesk_core::documents::{DocumentKind, LineItem, resolve_total};
use opsdesk_core::validation::{RuleViolation, check_date_range, check_non_negative};
use opsdesk_db::entities::sea_orm_active_enums::DocumentStatus;
use opsdesk_db::repositories::{
    CreateDocumentInput, DocumentError, DocumentFilter, DocumentView, EntityRef,
    UpdateDocumentInput,
};
use opsdesk_db::{DocumentRepository, Resolver};
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

/// Collection path of a document kind.
#[must_use]
pub const fn collection_path(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::SalesOrder => "/SalesOrders",
        DocumentKind::Invoice => "/Invoices",
        DocumentKind::PurchaseOrder => "/PurchaseOrders",
        DocumentKind::VendorBill => "/VendorBills",
    }
}

/// Creates the routes of one document kind.
pub fn routes(kind: DocumentKind) -> Router<AppState> {
    let base = collection_path(kind);
    Router::new()
        .route(base, get(list_documents).post(create_document))
        .route(
            &format!("{base}/{{uuid}}"),
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .layer(Extension(kind))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Counterpart {
    Client(Option<EntityRef>),
    Vendor(Option<EntityRef>),
}

#[derive(Debug, Serialize)]
struct DocumentResponse {
    uuid: Uuid,
    date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<Option<NaiveDate>>,
    status: DocumentStatus,
    items: Vec<LineItem>,
    total_amount: Decimal,
    project: Option<EntityRef>,
    #[serde(flatten)]
    counterpart: Counterpart,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl DocumentResponse {
    fn build(kind: DocumentKind, view: DocumentView) -> Result<Self, DocumentError> {
        let record = view.record;
        let items: Vec<LineItem> = serde_json::from_value(record.items)?;
        let counterpart = match kind.side() {
            CounterpartSide::Sales => Counterpart::Client(view.counterpart),
            CounterpartSide::Purchase => Counterpart::Vendor(view.counterpart),
        };
        Ok(Self {
            uuid: record.uuid,
            date: record.date,
            due_date: kind.has_due_date().then_some(record.due_date),
            status: record.status,
            items,
            total_amount: record.total_amount,
            project: view.project,
            counterpart,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Query parameters for listing documents.
#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Filter by status.
    pub status: Option<DocumentStatus>,
    /// Filter by project.
    pub project_uuid: Option<Uuid>,
    /// Filter by client (sales side).
    pub client_uuid: Option<Uuid>,
    /// Filter by vendor (purchase side).
    pub vendor_uuid: Option<Uuid>,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
    /// Substring match on item descriptions.
    pub search: Option<String>,
}

/// Request to create a document.
///
/// Only the counterpart field matching the kind is read: `client_uuid` for
/// sales orders and invoices, `vendor_uuid` for purchase orders and bills.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    /// Related project.
    pub project_uuid: Option<Uuid>,
    /// Client for sales documents.
    pub client_uuid: Option<Uuid>,
    /// Vendor for purchase documents.
    pub vendor_uuid: Option<Uuid>,
    /// Document date; defaults to today.
    pub date: Option<NaiveDate>,
    /// Payment due date; invoices and vendor bills only.
    pub due_date: Option<NaiveDate>,
    /// Status; defaults to `draft`.
    pub status: Option<DocumentStatus>,
    /// Line items.
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Total; defaults to the sum of the items.
    pub total_amount: Option<Decimal>,
}

/// Request to change a document. `null` clears an optional reference.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDocumentRequest {
    /// Related project.
    #[serde(default, deserialize_with = "nullable")]
    pub project_uuid: Option<Option<Uuid>>,
    /// Client for sales documents.
    #[serde(default, deserialize_with = "nullable")]
    pub client_uuid: Option<Option<Uuid>>,
    /// Vendor for purchase documents.
    #[serde(default, deserialize_with = "nullable")]
    pub vendor_uuid: Option<Option<Uuid>>,
    /// Document date.
    pub date: Option<NaiveDate>,
    /// Payment due date; invoices and vendor bills only.
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,
    /// Status.
    pub status: Option<DocumentStatus>,
    /// Replacement line items.
    pub items: Option<Vec<LineItem>>,
    /// Total; recomputed from new items when omitted.
    pub total_amount: Option<Decimal>,
}

fn pick_side<T>(kind: DocumentKind, client: T, vendor: T) -> T {
    match kind.side() {
        CounterpartSide::Sales => client,
        CounterpartSide::Purchase => vendor,
    }
}

fn check_amounts(items: Option<&[LineItem]>, total: Option<Decimal>) -> Result<(), RuleViolation> {
    for item in items.unwrap_or_default() {
        check_non_negative(item.quantity, "items")?;
        check_non_negative(item.unit_price, "items")?;
    }
    if let Some(total) = total {
        check_non_negative(total, "total_amount")?;
    }
    resolve_total(items, total).map(drop)
}

async fn list_documents(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    auth: AuthUser,
    ListQuery(query): ListQuery<DocumentListQuery>,
) -> ApiResult<Response> {
    auth.require(RoleSet::OFFICE)?;
    let page = PageRequest::from_query(query.page, query.limit);
    let resolver = Resolver::new((*state.db).clone());
    let filter = DocumentFilter {
        status: query.status,
        project: resolver
            .project_filter(auth.company_id, query.project_uuid)
            .await?,
        counterpart: resolver
            .contact_filter(
                auth.company_id,
                pick_side(kind, query.client_uuid, query.vendor_uuid),
            )
            .await?,
        from: query.from,
        to: query.to,
        search: query.search,
    };

    let repo = DocumentRepository::new((*state.db).clone(), kind);
    let paged = repo.list(auth.company_id, &filter, page).await?;
    let rows = repo
        .with_refs(paged.rows)
        .await?
        .into_iter()
        .map(|view| DocumentResponse::build(kind, view))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(response::page(
        format!("{} list", kind.label()),
        Paged::new(rows, paged.total_count),
        page,
    ))
}

async fn get_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::OFFICE)?;
    let repo = DocumentRepository::new((*state.db).clone(), kind);
    let record = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(DocumentError::NotFound(kind.label(), uuid))?;
    let view = repo.view(record).await?;
    Ok(response::ok(
        kind.label(),
        DocumentResponse::build(kind, view)?,
    ))
}

async fn create_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<CreateDocumentRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::FINANCE)?;
    check_amounts(Some(&payload.items), payload.total_amount)?;
    let date = payload.date.unwrap_or_else(|| Utc::now().date_naive());
    let due_date = payload.due_date.filter(|_| kind.has_due_date());
    check_date_range(Some(date), due_date, "due_date")?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = resolver
        .project(auth.company_id, payload.project_uuid)
        .await?;
    let counterpart_id = resolver
        .counterpart(
            auth.company_id,
            pick_side(kind, payload.client_uuid, payload.vendor_uuid),
            kind.side(),
        )
        .await?;

    let repo = DocumentRepository::new((*state.db).clone(), kind);
    let record = repo
        .create(CreateDocumentInput {
            company_id: auth.company_id,
            project_id,
            counterpart_id,
            date,
            due_date,
            status: payload.status.unwrap_or(DocumentStatus::Draft),
            items: payload.items,
            total_amount: payload.total_amount,
        })
        .await?;

    info!(kind = kind.label(), document_uuid = %record.uuid, actor = %auth.uuid, "Document created");
    let view = repo.view(record).await?;
    Ok(response::created(
        format!("{} created", kind.label()),
        DocumentResponse::build(kind, view)?,
    ))
}

async fn update_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateDocumentRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::FINANCE)?;
    check_amounts(payload.items.as_deref(), payload.total_amount)?;

    let repo = DocumentRepository::new((*state.db).clone(), kind);
    let record = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(DocumentError::NotFound(kind.label(), uuid))?;

    let due_date = payload.due_date.filter(|_| kind.has_due_date());
    check_date_range(
        Some(payload.date.unwrap_or(record.date)),
        due_date.unwrap_or(record.due_date),
        "due_date",
    )?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = match payload.project_uuid {
        Some(project) => Some(resolver.project(auth.company_id, project).await?),
        None => None,
    };
    let counterpart_id = match pick_side(kind, payload.client_uuid, payload.vendor_uuid) {
        Some(counterpart) => Some(
            resolver
                .counterpart(auth.company_id, counterpart, kind.side())
                .await?,
        ),
        None => None,
    };

    let updated = repo
        .update(
            &record,
            UpdateDocumentInput {
                project_id,
                counterpart_id,
                date: payload.date,
                due_date,
                status: payload.status,
                items: payload.items,
                total_amount: payload.total_amount,
            },
        )
        .await?;

    info!(kind = kind.label(), document_uuid = %updated.uuid, actor = %auth.uuid, "Document updated");
    let view = repo.view(updated).await?;
    Ok(response::ok(
        format!("{} updated", kind.label()),
        DocumentResponse::build(kind, view)?,
    ))
}

async fn delete_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::FINANCE)?;
    DocumentRepository::new((*state.db).clone(), kind)
        .delete(auth.company_id, uuid)
        .await?;
    info!(kind = kind.label(), document_uuid = %uuid, actor = %auth.uuid, "Document deleted");
    Ok(response::deleted(format!("{} deleted", kind.label())))
}
