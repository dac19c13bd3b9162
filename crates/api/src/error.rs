//! API error type and its HTTP rendering.
//!
//! Handlers return [`ApiResult`]; every repository, resolver and rule error
//! converts into [`ApiError`] with `?`. Internal failures are logged in full
//! and reach the client only as a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opsdesk_core::auth::PasswordError;
use opsdesk_core::reference::ReferenceError;
use opsdesk_core::validation::RuleViolation;
use opsdesk_db::repositories::{
    CompanyError, ContactError, DocumentError, ExpenseError, ProjectError, ResolveError,
    TaskError, TimesheetError, UserError,
};
use opsdesk_shared::{AppError, FieldError, JwtError};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AppError`] on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 404 with the given message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }

    /// 403 with the given message.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// 401 with the given message.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// 422 on a single field.
    #[must_use]
    pub fn field(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self(AppError::field(field, code, message))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_internal() {
            error!(error = %err, "Request failed with an internal error");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let errors = match &err {
            AppError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };

        let body = json!({
            "status": status.as_u16(),
            "message": err.public_message(),
            "data": {
                "code": err.error_code(),
                "errors": errors,
            },
        });
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<ReferenceError> for ApiError {
    fn from(err: ReferenceError) -> Self {
        Self::field(err.field_name(), err.code(), err.to_string())
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Reference(reference) => reference.into(),
            ResolveError::Database(db) => db.into(),
        }
    }
}

impl From<RuleViolation> for ApiError {
    fn from(err: RuleViolation) -> Self {
        Self::field(err.field, err.code, err.message)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    FieldError::new(
                        field.to_string(),
                        e.code.to_uppercase(),
                        e.message
                            .as_ref()
                            .map_or_else(|| "Invalid value".to_string(), ToString::to_string),
                    )
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self(AppError::Validation(fields))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::unauthorized("Token has expired"),
            JwtError::DecodingError(_) => Self::unauthorized("Invalid or malformed token"),
            JwtError::EncodingError(e) => Self(AppError::Internal(e)),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailTaken(_) => Self(AppError::Conflict(
                "Email is already registered".to_string(),
            )),
            UserError::NotFound(_) => Self::not_found("User not found"),
            UserError::Password(e) => e.into(),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<CompanyError> for ApiError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::NotFound(_) => Self::not_found("Company not found"),
            CompanyError::User(e) => e.into(),
            CompanyError::Database(e) => e.into(),
        }
    }
}

macro_rules! not_found_or_db {
    ($error:ident, $message:literal) => {
        impl From<$error> for ApiError {
            fn from(err: $error) -> Self {
                match err {
                    $error::NotFound(_) => Self::not_found($message),
                    $error::Database(e) => e.into(),
                }
            }
        }
    };
}

not_found_or_db!(ContactError, "Contact not found");
not_found_or_db!(ProjectError, "Project not found");
not_found_or_db!(TaskError, "Task not found");
not_found_or_db!(TimesheetError, "Timesheet not found");
not_found_or_db!(ExpenseError, "Expense not found");

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(label, _) => Self::not_found(format!("{label} not found")),
            DocumentError::Total(violation) => violation.into(),
            DocumentError::Items(e) => Self(AppError::Internal(e.to_string())),
            DocumentError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::reference::ReferenceField;
    use uuid::Uuid;

    #[test]
    fn test_reference_error_names_wire_field() {
        let ApiError(err) = ReferenceError::new(ReferenceField::Client).into();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "client_uuid");
                assert_eq!(fields[0].code, "INVALID_CLIENT");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_email_taken_is_conflict() {
        let ApiError(err) = UserError::EmailTaken("a@b.c".to_string()).into();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_database_error_is_hidden() {
        let ApiError(err) = DbErr::Custom("relation \"users\" does not exist".to_string()).into();
        assert!(err.is_internal());
        assert_eq!(err.public_message(), "An internal error occurred");
    }

    #[test]
    fn test_document_not_found_uses_kind_label() {
        let ApiError(err) = DocumentError::NotFound("Invoice", Uuid::nil()).into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.public_message(), "Invoice not found");
    }

    #[test]
    fn test_rule_violation_is_field_error() {
        let violation = opsdesk_core::validation::check_positive(
            rust_decimal::Decimal::ZERO,
            "hours",
        )
        .unwrap_err();
        let ApiError(err) = violation.into();
        match err {
            AppError::Validation(fields) => assert_eq!(fields[0].code, "MUST_BE_POSITIVE"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_document_total_is_unprocessable() {
        let violation = opsdesk_core::validation::check_at_most(
            rust_decimal::Decimal::MAX,
            opsdesk_core::validation::MAX_AMOUNT,
            "total_amount",
        )
        .unwrap_err();
        let ApiError(err) = DocumentError::Total(violation).into();
        assert_eq!(err.status_code(), 422);
    }
}
