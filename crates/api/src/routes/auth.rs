//! Authentication routes: signup, login, the current user, and admin user management.

use axum::{
    Router,
    extract::State,
    response::Response,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use opsdesk_core::auth::{RoleSet, UserRole, verify_missing, verify_password};
use opsdesk_core::validation::{MAX_RATE, RuleViolation, check_at_most, check_non_negative};
use opsdesk_db::entities::{companies, sea_orm_active_enums::UserRole as DbUserRole, users};
use opsdesk_db::repositories::{
    CreateUserInput, SignupInput, UpdateUserInput, UserError, UserFilter, normalize_email,
};
use opsdesk_db::{CompanyRepository, UserRepository};
use opsdesk_shared::types::PageRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{EntityId, ListQuery, ValidJson, nullable};
use crate::middleware::AuthUser;
use crate::response;

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/Auth/signup", post(signup))
        .route("/Auth/login", post(login))
}

/// Routes behind the auth middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/Auth/me", get(me))
        .route("/Auth/users", get(list_users).post(create_user))
        .route(
            "/Auth/users/{uuid}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Public view of a user. The password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Public identifier.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role.
    pub role: UserRole,
    /// Hourly cost rate.
    pub hourly_rate: Option<Decimal>,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// Last update time.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            uuid: user.uuid,
            name: user.name,
            email: user.email,
            role: user.role.into(),
            hourly_rate: user.hourly_rate,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompanySummary {
    uuid: Uuid,
    name: String,
}

impl From<companies::Model> for CompanySummary {
    fn from(company: companies::Model) -> Self {
        Self {
            uuid: company.uuid,
            name: company.name,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    token: String,
    expires_in: i64,
    user: UserResponse,
    company: Option<CompanySummary>,
}

/// Signup request: creates a tenant and its first admin.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Company name.
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub company_name: String,
    /// Admin display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Admin email.
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Admin password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Admin request to add a user to the tenant.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Login email.
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Initial password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Role; defaults to `team_member`.
    #[serde(default)]
    pub role: Option<DbUserRole>,
    /// Hourly cost rate.
    pub hourly_rate: Option<Decimal>,
}

/// Admin request to change a user.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: Option<String>,
    /// Login email.
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// New password.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    /// Role.
    pub role: Option<DbUserRole>,
    /// Hourly cost rate; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub hourly_rate: Option<Option<Decimal>>,
}

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    /// Page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Filter by role.
    pub role: Option<DbUserRole>,
    /// Substring match on name or email.
    pub search: Option<String>,
}

fn issue_session(
    state: &AppState,
    user: users::Model,
    company: Option<companies::Model>,
) -> ApiResult<SessionResponse> {
    let role = UserRole::from(user.role);
    let token = state
        .jwt_service
        .generate_token(user.uuid, &user.email, role.as_str())?;
    Ok(SessionResponse {
        token,
        expires_in: state.jwt_service.expires_in(),
        user: user.into(),
        company: company.map(CompanySummary::from),
    })
}

/// POST /Auth/signup - Create a company and its admin, and log the admin in.
async fn signup(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> ApiResult<Response> {
    let users_repo = UserRepository::new((*state.db).clone(), state.password_policy);
    let companies_repo = CompanyRepository::new((*state.db).clone());

    let (company, admin) = companies_repo
        .signup(
            &users_repo,
            SignupInput {
                company_name: payload.company_name,
                name: payload.name,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    info!(company_uuid = %company.uuid, user_uuid = %admin.uuid, "Company signed up");
    let session = issue_session(&state, admin, Some(company))?;
    Ok(response::created("Signup successful", session))
}

/// POST /Auth/login - Exchange credentials for a token.
async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<Response> {
    let users_repo = UserRepository::new((*state.db).clone(), state.password_policy);
    let email = normalize_email(&payload.email);

    let Some(user) = users_repo.find_by_email(&email).await? else {
        verify_missing(&payload.password, &state.password_policy)?;
        info!("Login attempt for unknown email");
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_uuid = %user.uuid, "Failed login attempt - invalid password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let company = CompanyRepository::new((*state.db).clone())
        .find_by_id(user.company_id)
        .await?;

    info!(user_uuid = %user.uuid, "User logged in");
    let session = issue_session(&state, user, company)?;
    Ok(response::ok("Login successful", session))
}

/// GET /Auth/me - The authenticated user and their company.
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Response> {
    let users_repo = UserRepository::new((*state.db).clone(), state.password_policy);
    let user = users_repo
        .find(auth.company_id, auth.uuid)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let company = CompanyRepository::new((*state.db).clone())
        .find_by_id(auth.company_id)
        .await?
        .map(CompanySummary::from);

    Ok(response::ok(
        "Current user",
        serde_json::json!({ "user": UserResponse::from(user), "company": company }),
    ))
}

/// GET /Auth/users - List users of the tenant.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    ListQuery(query): ListQuery<UserListQuery>,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    let page = PageRequest::from_query(query.page, query.limit);
    let filter = UserFilter {
        role: query.role,
        search: query.search,
    };

    let rows = UserRepository::new((*state.db).clone(), state.password_policy)
        .list(auth.company_id, &filter, page)
        .await?
        .map(UserResponse::from);
    Ok(response::page("Users", rows, page))
}

/// POST /Auth/users - Add a user to the tenant.
fn check_hourly_rate(rate: Option<Decimal>) -> Result<(), RuleViolation> {
    if let Some(rate) = rate {
        check_non_negative(rate, "hourly_rate")?;
        check_at_most(rate, MAX_RATE, "hourly_rate")?;
    }
    Ok(())
}

async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    check_hourly_rate(payload.hourly_rate)?;

    let user = UserRepository::new((*state.db).clone(), state.password_policy)
        .create(CreateUserInput {
            company_id: auth.company_id,
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: payload.role.unwrap_or(DbUserRole::TeamMember),
            hourly_rate: payload.hourly_rate,
        })
        .await?;

    info!(actor = %auth.uuid, user_uuid = %user.uuid, "User created");
    Ok(response::created("User created", UserResponse::from(user)))
}

/// GET /Auth/users/{uuid}
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    let user = UserRepository::new((*state.db).clone(), state.password_policy)
        .find(auth.company_id, uuid)
        .await?
        .ok_or(UserError::NotFound(uuid))?;
    Ok(response::ok("User", UserResponse::from(user)))
}

/// PUT /Auth/users/{uuid}
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    let users_repo = UserRepository::new((*state.db).clone(), state.password_policy);
    let user = users_repo
        .find(auth.company_id, uuid)
        .await?
        .ok_or(UserError::NotFound(uuid))?;
    check_hourly_rate(payload.hourly_rate.flatten())?;

    let user = users_repo
        .update(
            user,
            UpdateUserInput {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role: payload.role,
                hourly_rate: payload.hourly_rate,
            },
        )
        .await?;

    info!(actor = %auth.uuid, user_uuid = %user.uuid, "User updated");
    Ok(response::ok("User updated", UserResponse::from(user)))
}

/// DELETE /Auth/users/{uuid}
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    EntityId(uuid): EntityId,
) -> ApiResult<Response> {
    auth.require(RoleSet::ADMIN)?;
    if uuid == auth.uuid {
        return Err(ApiError::field(
            "uuid",
            "CANNOT_DELETE_SELF",
            "Admins cannot delete their own account",
        ));
    }

    UserRepository::new((*state.db).clone(), state.password_policy)
        .delete(auth.company_id, uuid)
        .await?;

    info!(actor = %auth.uuid, user_uuid = %uuid, "User deleted");
    Ok(response::deleted("User deleted"))
}
