//! Financial document repository.
//!
//! Sales orders, invoices, purchase orders and vendor bills live in four
//! tables with the same shape. One repository serves all of them, picking
//! the table from its [`DocumentKind`].

use chrono::NaiveDate;
use opsdesk_core::documents::{DocumentKind, LineItem, resolve_total};
use opsdesk_core::validation::RuleViolation;
use opsdesk_shared::types::{PageRequest, Paged};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::common::{RefFilter, date_between, fetch_page, search_pattern};
use super::lookup::{EntityRef, contact_refs, ids, pick, project_refs};
use crate::entities::sea_orm_active_enums::DocumentStatus;

/// Error types for document operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Document not found.
    #[error("{0} not found: {1}")]
    NotFound(&'static str, Uuid),

    /// The total does not fit a stored amount.
    #[error(transparent)]
    Total(#[from] RuleViolation),

    /// Line items could not be encoded.
    #[error("Invalid line items: {0}")]
    Items(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A document row, independent of its table.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// Internal id.
    pub id: i32,
    /// Public identifier.
    pub uuid: Uuid,
    /// Owning company.
    pub company_id: i32,
    /// Related project.
    pub project_id: Option<i32>,
    /// Client or vendor, depending on the kind.
    pub counterpart_id: Option<i32>,
    /// Document date.
    pub date: NaiveDate,
    /// Payment due date; always `None` for orders.
    pub due_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Line items as stored.
    pub items: serde_json::Value,
    /// Total amount.
    pub total_amount: Decimal,
    /// Creation time.
    pub created_at: DateTimeWithTimeZone,
    /// Last update time.
    pub updated_at: DateTimeWithTimeZone,
}

/// Document with its references loaded.
#[derive(Debug, Clone)]
pub struct DocumentView {
    /// The document record.
    pub record: DocumentRecord,
    /// Related project.
    pub project: Option<EntityRef>,
    /// Client or vendor.
    pub counterpart: Option<EntityRef>,
}

/// Input for creating a document. References are already resolved.
#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    /// Owning company.
    pub company_id: i32,
    /// Related project.
    pub project_id: Option<i32>,
    /// Client or vendor.
    pub counterpart_id: Option<i32>,
    /// Document date.
    pub date: NaiveDate,
    /// Payment due date; ignored for orders.
    pub due_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Line items.
    pub items: Vec<LineItem>,
    /// Explicit total; computed from the items when absent.
    pub total_amount: Option<Decimal>,
}

/// Input for updating a document.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentInput {
    /// Related project.
    pub project_id: Option<Option<i32>>,
    /// Client or vendor.
    pub counterpart_id: Option<Option<i32>>,
    /// Document date.
    pub date: Option<NaiveDate>,
    /// Payment due date; ignored for orders.
    pub due_date: Option<Option<NaiveDate>>,
    /// Lifecycle status.
    pub status: Option<DocumentStatus>,
    /// Replacement line items.
    pub items: Option<Vec<LineItem>>,
    /// Explicit total; recomputed from new items when absent.
    pub total_amount: Option<Decimal>,
}

/// Filter options for listing documents.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    /// Filter by status.
    pub status: Option<DocumentStatus>,
    /// Filter by project.
    pub project: RefFilter,
    /// Filter by client or vendor.
    pub counterpart: RefFilter,
    /// Dated on or after.
    pub from: Option<NaiveDate>,
    /// Dated on or before.
    pub to: Option<NaiveDate>,
    /// Substring match on line item descriptions.
    pub search: Option<String>,
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self {
            status: None,
            project: RefFilter::Any,
            counterpart: RefFilter::Any,
            from: None,
            to: None,
            search: None,
        }
    }
}

/// Row values shared by create and update after items are encoded.
#[derive(Debug, Clone, Default)]
struct Patch {
    project_id: Option<Option<i32>>,
    counterpart_id: Option<Option<i32>>,
    date: Option<NaiveDate>,
    due_date: Option<Option<NaiveDate>>,
    status: Option<DocumentStatus>,
    items: Option<serde_json::Value>,
    total_amount: Option<Decimal>,
}

impl Patch {
    fn create(kind: DocumentKind, input: CreateDocumentInput) -> Result<Self, DocumentError> {
        let total_amount =
            resolve_total(Some(&input.items), input.total_amount)?.unwrap_or(Decimal::ZERO);
        Ok(Self {
            project_id: Some(input.project_id),
            counterpart_id: Some(input.counterpart_id),
            date: Some(input.date),
            due_date: Some(input.due_date.filter(|_| kind.has_due_date())),
            status: Some(input.status),
            items: Some(encode_items(&input.items)?),
            total_amount: Some(total_amount),
        })
    }

    fn update(kind: DocumentKind, input: UpdateDocumentInput) -> Result<Self, DocumentError> {
        let total_amount = resolve_total(input.items.as_deref(), input.total_amount)?;
        let items = input.items.as_deref().map(encode_items).transpose()?;
        Ok(Self {
            project_id: input.project_id,
            counterpart_id: input.counterpart_id,
            date: input.date,
            due_date: input.due_date.filter(|_| kind.has_due_date()),
            status: input.status,
            items,
            total_amount,
        })
    }
}

/// `EXISTS` over the JSON items, matching descriptions case-insensitively.
fn items_match(pattern: String) -> sea_orm::sea_query::SimpleExpr {
    Expr::cust_with_values(
        "EXISTS (SELECT 1 FROM jsonb_array_elements(items) AS item \
         WHERE lower(item->>'description') LIKE $1)",
        [pattern],
    )
}

macro_rules! due_date_of {
    (true, $model:expr) => {
        $model.due_date
    };
    (false, $model:expr) => {
        None
    };
}

macro_rules! apply_due_date {
    (true, $active:ident, $patch:ident) => {
        if let Some(due_date) = $patch.due_date {
            $active.due_date = Set(due_date);
        }
    };
    (false, $active:ident, $patch:ident) => {};
}

macro_rules! document_table {
    ($module:ident, $entity:ident, $counterpart:ident, $Counterpart:ident, due_date: $due:tt) => {
        mod $module {
            use super::*;
            use crate::entities::$entity;

            fn record(model: $entity::Model) -> DocumentRecord {
                DocumentRecord {
                    id: model.id,
                    uuid: model.uuid,
                    company_id: model.company_id,
                    project_id: model.project_id,
                    counterpart_id: model.$counterpart,
                    date: model.date,
                    due_date: due_date_of!($due, model),
                    status: model.status,
                    items: model.items,
                    total_amount: model.total_amount,
                    created_at: model.created_at,
                    updated_at: model.updated_at,
                }
            }

            fn apply(active: &mut $entity::ActiveModel, patch: Patch) {
                if let Some(project_id) = patch.project_id {
                    active.project_id = Set(project_id);
                }
                if let Some(counterpart_id) = patch.counterpart_id {
                    active.$counterpart = Set(counterpart_id);
                }
                if let Some(date) = patch.date {
                    active.date = Set(date);
                }
                apply_due_date!($due, active, patch);
                if let Some(status) = patch.status {
                    active.status = Set(status);
                }
                if let Some(items) = patch.items {
                    active.items = Set(items);
                }
                if let Some(total_amount) = patch.total_amount {
                    active.total_amount = Set(total_amount);
                }
            }

            pub(super) async fn insert<C: ConnectionTrait>(
                db: &C,
                company_id: i32,
                patch: Patch,
            ) -> Result<DocumentRecord, DbErr> {
                let now: DateTimeWithTimeZone = chrono::Utc::now().into();
                let mut active = $entity::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    company_id: Set(company_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                apply(&mut active, patch);
                active.insert(db).await.map(record)
            }

            pub(super) async fn find<C: ConnectionTrait>(
                db: &C,
                company_id: i32,
                uuid: Uuid,
            ) -> Result<Option<DocumentRecord>, DbErr> {
                let model = $entity::Entity::find()
                    .filter($entity::Column::CompanyId.eq(company_id))
                    .filter($entity::Column::Uuid.eq(uuid))
                    .one(db)
                    .await?;
                Ok(model.map(record))
            }

            pub(super) async fn list<C: ConnectionTrait>(
                db: &C,
                company_id: i32,
                filter: &DocumentFilter,
                page: PageRequest,
            ) -> Result<Paged<DocumentRecord>, DbErr> {
                let mut cond = Condition::all().add($entity::Column::CompanyId.eq(company_id));
                if let Some(status) = filter.status {
                    cond = cond.add($entity::Column::Status.eq(status));
                }
                cond = filter.project.apply(cond, $entity::Column::ProjectId);
                cond = filter.counterpart.apply(cond, $entity::Column::$Counterpart);
                cond = date_between(cond, $entity::Column::Date, filter.from, filter.to);
                if let Some(pattern) = search_pattern(filter.search.as_deref()) {
                    cond = cond.add(items_match(pattern));
                }

                let select = $entity::Entity::find()
                    .filter(cond)
                    .order_by_desc($entity::Column::Date)
                    .order_by_desc($entity::Column::Id);
                Ok(fetch_page(select, db, page).await?.map(record))
            }

            pub(super) async fn update<C: ConnectionTrait>(
                db: &C,
                id: i32,
                patch: Patch,
            ) -> Result<DocumentRecord, DbErr> {
                let model = $entity::Entity::find_by_id(id)
                    .one(db)
                    .await?
                    .ok_or_else(|| DbErr::RecordNotFound(format!("{} {id}", stringify!($entity))))?;
                let mut active: $entity::ActiveModel = model.into();
                apply(&mut active, patch);
                active.updated_at = Set(chrono::Utc::now().into());
                active.update(db).await.map(record)
            }

            pub(super) async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), DbErr> {
                $entity::Entity::delete_by_id(id).exec(db).await?;
                Ok(())
            }
        }
    };
}

document_table!(sales_order, sales_orders, client_id, ClientId, due_date: false);
document_table!(invoice, invoices, client_id, ClientId, due_date: true);
document_table!(purchase_order, purchase_orders, vendor_id, VendorId, due_date: false);
document_table!(vendor_bill, vendor_bills, vendor_id, VendorId, due_date: true);

macro_rules! on_table {
    ($kind:expr, |$table:ident| $body:expr) => {
        match $kind {
            DocumentKind::SalesOrder => {
                use sales_order as $table;
                $body
            }
            DocumentKind::Invoice => {
                use invoice as $table;
                $body
            }
            DocumentKind::PurchaseOrder => {
                use purchase_order as $table;
                $body
            }
            DocumentKind::VendorBill => {
                use vendor_bill as $table;
                $body
            }
        }
    };
}

fn encode_items(items: &[LineItem]) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(items)
}

/// Repository for one kind of financial document.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
    kind: DocumentKind,
}

impl DocumentRepository {
    /// Creates a repository bound to one document kind.
    #[must_use]
    pub const fn new(db: DatabaseConnection, kind: DocumentKind) -> Self {
        Self { db, kind }
    }

    /// The kind this repository serves.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Creates a document. The total falls back to the sum of the items.
    ///
    /// # Errors
    ///
    /// Returns an error if the total is too large, the items cannot be encoded
    /// or the insert fails.
    pub async fn create(&self, input: CreateDocumentInput) -> Result<DocumentRecord, DocumentError> {
        let company_id = input.company_id;
        let patch = Patch::create(self.kind, input)?;
        let record = on_table!(self.kind, |table| table::insert(&self.db, company_id, patch).await)?;
        Ok(record)
    }

    /// Finds a document by UUID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, company_id: i32, uuid: Uuid) -> Result<Option<DocumentRecord>, DbErr> {
        on_table!(self.kind, |table| table::find(&self.db, company_id, uuid).await)
    }

    /// Lists documents of a company, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        company_id: i32,
        filter: &DocumentFilter,
        page: PageRequest,
    ) -> Result<Paged<DocumentRecord>, DbErr> {
        on_table!(self.kind, |table| table::list(&self.db, company_id, filter, page).await)
    }

    /// Loads the project and counterpart of each document.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn with_refs(&self, rows: Vec<DocumentRecord>) -> Result<Vec<DocumentView>, DbErr> {
        let projects = project_refs(&self.db, &ids(rows.iter().map(|d| d.project_id))).await?;
        let contacts = contact_refs(&self.db, &ids(rows.iter().map(|d| d.counterpart_id))).await?;

        Ok(rows
            .into_iter()
            .map(|record| DocumentView {
                project: pick(&projects, record.project_id),
                counterpart: pick(&contacts, record.counterpart_id),
                record,
            })
            .collect())
    }

    /// Loads the references of a single document.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    pub async fn view(&self, record: DocumentRecord) -> Result<DocumentView, DbErr> {
        let mut views = self.with_refs(vec![record]).await?;
        views
            .pop()
            .ok_or_else(|| DbErr::Custom("document view lost its row".to_string()))
    }

    /// Applies a partial update. New items without a total recompute the total.
    ///
    /// # Errors
    ///
    /// Returns an error if the items cannot be encoded or the update fails.
    pub async fn update(
        &self,
        record: &DocumentRecord,
        input: UpdateDocumentInput,
    ) -> Result<DocumentRecord, DocumentError> {
        let patch = Patch::update(self.kind, input)?;
        let id = record.id;
        let updated = on_table!(self.kind, |table| table::update(&self.db, id, patch).await)?;
        Ok(updated)
    }

    /// Deletes a document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` without touching any row if the document is not in the company.
    pub async fn delete(&self, company_id: i32, uuid: Uuid) -> Result<(), DocumentError> {
        let record = self
            .find(company_id, uuid)
            .await?
            .ok_or(DocumentError::NotFound(self.kind.label(), uuid))?;
        on_table!(self.kind, |table| table::delete(&self.db, record.id).await)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_encode_items_keeps_wire_shape() {
        let items = vec![LineItem {
            description: "Design".to_string(),
            quantity: dec!(2),
            unit_price: dec!(150.00),
        }];
        let value = encode_items(&items).unwrap();
        assert_eq!(value[0]["description"], "Design");
        assert_eq!(value[0]["quantity"], "2");
        assert_eq!(value[0]["unit_price"], "150.00");
    }

    #[test]
    fn test_not_found_names_the_kind() {
        let uuid = Uuid::nil();
        let err = DocumentError::NotFound(DocumentKind::VendorBill.label(), uuid);
        assert_eq!(
            err.to_string(),
            format!("Vendor bill not found: {uuid}")
        );
    }

    fn create_input(due_date: Option<NaiveDate>, items: Vec<LineItem>) -> CreateDocumentInput {
        CreateDocumentInput {
            company_id: 1,
            project_id: None,
            counterpart_id: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date,
            status: DocumentStatus::Draft,
            items,
            total_amount: None,
        }
    }

    #[test]
    fn test_orders_never_carry_a_due_date() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 31);

        let order = Patch::create(DocumentKind::SalesOrder, create_input(due, vec![])).unwrap();
        assert_eq!(order.due_date, Some(None));
        let invoice = Patch::create(DocumentKind::Invoice, create_input(due, vec![])).unwrap();
        assert_eq!(invoice.due_date, Some(due));

        let update = UpdateDocumentInput {
            due_date: Some(due),
            ..Default::default()
        };
        let order = Patch::update(DocumentKind::PurchaseOrder, update.clone()).unwrap();
        assert_eq!(order.due_date, None);
        let bill = Patch::update(DocumentKind::VendorBill, update).unwrap();
        assert_eq!(bill.due_date, Some(due));
    }

    #[test]
    fn test_create_totals_items_and_rejects_overflow() {
        let items = vec![LineItem {
            description: "Design".to_string(),
            quantity: dec!(3),
            unit_price: dec!(40),
        }];
        let patch = Patch::create(DocumentKind::Invoice, create_input(None, items)).unwrap();
        assert_eq!(patch.total_amount, Some(dec!(120)));

        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let items = vec![LineItem {
            description: "Everything".to_string(),
            quantity: huge,
            unit_price: huge,
        }];
        let err = Patch::create(DocumentKind::Invoice, create_input(None, items)).unwrap_err();
        assert!(matches!(err, DocumentError::Total(v) if v.code == "TOO_LARGE"));
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let filter = DocumentFilter::default();
        assert_eq!(filter.project, RefFilter::Any);
        assert_eq!(filter.counterpart, RefFilter::Any);
        assert!(filter.search.is_none());
    }
}
