//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use opsdesk_core::auth::{RoleSet, UserRole};
use tracing::{debug, error};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use opsdesk_db::UserRepository;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Loads the user it names, so the tenant and role are always current
/// 4. Stores an [`AuthUser`] in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            return ApiError::from(e).into_response();
        }
    };

    let users = UserRepository::new((*state.db).clone(), state.password_policy);
    let user = match users.find_by_uuid(claims.user_id()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(user_uuid = %claims.user_id(), "Token names a user that no longer exists");
            return ApiError::unauthorized("Invalid or malformed token").into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error loading authenticated user");
            return ApiError::from(e).into_response();
        }
    };

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        uuid: user.uuid,
        company_id: user.company_id,
        email: user.email,
        role: user.role.into(),
    });
    next.run(request).await
}

/// The authenticated caller.
///
/// Use this in handlers to get the caller's tenant and role:
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> ApiResult<Response> {
///     auth.require(RoleSet::FINANCE)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Internal user id.
    pub id: i32,
    /// Public user UUID.
    pub uuid: Uuid,
    /// The caller's company; every query is scoped to it.
    pub company_id: i32,
    /// Login email.
    pub email: String,
    /// Current role.
    pub role: UserRole,
}

impl AuthUser {
    /// Fails with 403 unless the caller's role is in `allowed`.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error naming the caller's role.
    pub fn require(&self, allowed: RoleSet) -> Result<(), ApiError> {
        if allowed.allows(self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role {} is not allowed to perform this action",
                self.role
            )))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
