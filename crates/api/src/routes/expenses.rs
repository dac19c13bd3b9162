//! Expense routes.

use axum::{Router, extract::State, response::Response, routing::get};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use opsdesk_core::auth::RoleSet;
use opsdesk_core::reference::ReferenceField;
use opsdesk_core::validation::{MAX_AMOUNT, RuleViolation, check_at_most, check_positive};
use opsdesk_db::entities::sea_orm_active_enums::DocumentStatus;
use opsdesk_db::repositories::{
    CreateExpenseInput, EntityRef, ExpenseError, ExpenseFilter, ExpenseView, UpdateExpenseInput,
};
use opsdesk_db::{ExpenseRepository, Resolver};
use opsdesk_shared::types::{PageRequest, Paged};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{EntityId, ListQuery, ValidJson, nullable};
use crate::middleware::AuthUser;
use crate::response;

/// Creates expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/Expenses", get(list_expenses).post(create_expense))
        .route(
            "/Expenses/{uuid}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

#[derive(Debug, Serialize)]
struct ExpenseResponse {
    uuid: Uuid,
    description: String,
    amount: Decimal,
    date: NaiveDate,
    billable: bool,
    status: DocumentStatus,
    receipt_url: Option<String>,
    project: Option<EntityRef>,
    user: Option<EntityRef>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<ExpenseView> for ExpenseResponse {
    fn from(view: ExpenseView) -> Self {
        let expense = view.expense;
        Self {
            uuid: expense.uuid,
            description: expense.description,
            amount: expense.amount,
            date: expense.date,
            billable: expense.billable,
            status: expense.status,
            receipt_url: expense.receipt_url,
            project: view.project,
            user: view.user,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}

/// Query parameters for listing expenses.
#[derive(Debug, Deserialize)]
pub struct ExpenseListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Filter by status.
    pub status: Option<DocumentStatus>,
    /// Filter by project.
    pub project_uuid: Option<Uuid>,
    /// Filter by the user who spent.
    pub user_uuid: Option<Uuid>,
    /// Filter by billable flag.
    pub billable: Option<bool>,
    /// Spent on or after.
    pub from: Option<NaiveDate>,
    /// Spent on or before.
    pub to: Option<NaiveDate>,
    /// Substring match on the description.
    pub search: Option<String>,
}

/// Request to record an expense.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    /// Project the expense belongs to.
    pub project_uuid: Uuid,
    /// Who spent; defaults to the caller.
    pub user_uuid: Option<Uuid>,
    /// What was bought.
    #[validate(length(min = 1, max = 500, message = "Description is required"))]
    pub description: String,
    /// Amount spent.
    pub amount: Decimal,
    /// Day spent; defaults to today.
    pub date: Option<NaiveDate>,
    /// Whether it is billed on; defaults to false.
    pub billable: Option<bool>,
    /// Status; defaults to `draft`.
    pub status: Option<DocumentStatus>,
    /// Link to the receipt.
    #[validate(length(max = 2048, message = "Receipt URL is too long"))]
    pub receipt_url: Option<String>,
}

/// Request to change an expense.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExpenseRequest {
    /// Project the expense belongs to.
    pub project_uuid: Option<Uuid>,
    /// Who spent; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub user_uuid: Option<Option<Uuid>>,
    /// What was bought.
    #[validate(length(min = 1, max = 500, message = "Description must not be empty"))]
    pub description: Option<String>,
    /// Amount spent.
    pub amount: Option<Decimal>,
    /// Day spent.
    pub date: Option<NaiveDate>,
    /// Whether it is billed on.
    pub billable: Option<bool>,
    /// Status.
    pub status: Option<DocumentStatus>,
    /// Link to the receipt.
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 2048, message = "Receipt URL is too long"))]
    pub receipt_url: Option<Option<String>>,
}

async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    ListQuery(query): ListQuery<ExpenseListQuery>,
) -> ApiResult<Response> {
    let page = PageRequest::from_query(query.page, query.limit);
    let resolver = Resolver::new((*state.db).clone());
    let filter = ExpenseFilter {
        status: query.status,
        project: resolver
            .project_filter(auth.company_id, query.project_uuid)
            .await?,
        user: resolver
            .user_filter(auth.company_id, query.user_uuid)
            .await?,
        billable: query.billable,
        from: query.from,
        to: query.to,
        search: query.search,
    };

    let repo = ExpenseRepository::new((*state.db).clone());
    let paged = repo.list(auth.company_id, &filter, page).await?;
    let rows = Paged::new(repo.with_refs(paged.rows).await?, paged.total_count)
        .map(ExpenseResponse::from);
    Ok(response::page("Expenses", rows, page))
}

async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(ExpenseError::NotFound(uuid))?;
    let view = repo.view(expense).await?;
    Ok(response::ok("Expense", ExpenseResponse::from(view)))
}

fn check_amount(amount: Decimal) -> Result<(), RuleViolation> {
    check_positive(amount, "amount")?;
    check_at_most(amount, MAX_AMOUNT, "amount")
}

async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<CreateExpenseRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::ANY)?;
    let status = payload.status.unwrap_or(DocumentStatus::Draft);
    if status != DocumentStatus::Draft && !RoleSet::OFFICE.allows(auth.role) {
        return Err(ApiError::forbidden(
            "Only managers and finance may record a reviewed expense",
        ));
    }
    check_amount(payload.amount)?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = resolver
        .required_project(auth.company_id, payload.project_uuid)
        .await?;
    let user_id = resolver
        .user(
            auth.company_id,
            Some(payload.user_uuid.unwrap_or(auth.uuid)),
            ReferenceField::User,
        )
        .await?
        .map(|user| user.id);

    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = repo
        .create(CreateExpenseInput {
            company_id: auth.company_id,
            project_id,
            user_id,
            description: payload.description,
            amount: payload.amount,
            date: payload.date.unwrap_or_else(|| Utc::now().date_naive()),
            billable: payload.billable.unwrap_or(false),
            status,
            receipt_url: payload.receipt_url,
        })
        .await?;

    info!(expense_uuid = %expense.uuid, actor = %auth.uuid, "Expense created");
    let view = repo.view(expense).await?;
    Ok(response::created("Expense created", ExpenseResponse::from(view)))
}

async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateExpenseRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::OFFICE)?;
    if let Some(amount) = payload.amount {
        check_amount(amount)?;
    }

    let repo = ExpenseRepository::new((*state.db).clone());
    let expense = repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(ExpenseError::NotFound(uuid))?;

    let resolver = Resolver::new((*state.db).clone());
    let project_id = match payload.project_uuid {
        Some(project) => Some(resolver.required_project(auth.company_id, project).await?),
        None => None,
    };
    let user_id = match payload.user_uuid {
        Some(user) => Some(
            resolver
                .user(auth.company_id, user, ReferenceField::User)
                .await?
                .map(|user| user.id),
        ),
        None => None,
    };

    let expense = repo
        .update(
            expense,
            UpdateExpenseInput {
                project_id,
                user_id,
                description: payload.description,
                amount: payload.amount,
                date: payload.date,
                billable: payload.billable,
                status: payload.status,
                receipt_url: payload.receipt_url,
            },
        )
        .await?;

    info!(expense_uuid = %expense.uuid, actor = %auth.uuid, "Expense updated");
    let view = repo.view(expense).await?;
    Ok(response::ok("Expense updated", ExpenseResponse::from(view)))
}

async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::FINANCE)?;
    ExpenseRepository::new((*state.db).clone())
        .delete(auth.company_id, uuid)
        .await?;
    info!(expense_uuid = %uuid, actor = %auth.uuid, "Expense deleted");
    Ok(response::deleted("Expense deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults_are_left_to_the_handler() {
        let request: CreateExpenseRequest = serde_json::from_str(
            r#"{"project_uuid": "7d0f8f3e-64c4-4f8e-8a4a-7e3f6a1f2b10", "description": "Taxi", "amount": "25"}"#,
        )
        .unwrap();
        assert_eq!(request.status, None);
        assert_eq!(request.billable, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_str::<UpdateExpenseRequest>(r#"{"status": "refunded"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_expenses_share_the_document_statuses() {
        for legacy in ["pending", "rejected"] {
            let body = format!(r#"{{"status": "{legacy}"}}"#);
            assert!(serde_json::from_str::<UpdateExpenseRequest>(&body).is_err());
        }
        for (wire, status) in [
            ("draft", DocumentStatus::Draft),
            ("sent", DocumentStatus::Sent),
            ("declined", DocumentStatus::Declined),
        ] {
            let body = format!(r#"{{"status": "{wire}"}}"#);
            let request: UpdateExpenseRequest = serde_json::from_str(&body).unwrap();
            assert_eq!(request.status, Some(status));
        }
    }

    #[test]
    fn test_amount_must_fit_the_column() {
        use rust_decimal_macros::dec;

        assert!(check_amount(dec!(999999999999.99)).is_ok());
        assert_eq!(check_amount(dec!(1000000000000)).unwrap_err().code, "TOO_LARGE");
        assert_eq!(check_amount(dec!(0)).unwrap_err().code, "MUST_BE_POSITIVE");
    }
}
