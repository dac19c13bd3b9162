//! Router tests that need no database.
//!
//! The state carries a disconnected connection, so every path exercised here
//! must answer before touching the store (or report the store as down).

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use opsdesk_api::{AppState, create_router, password_policy};
use opsdesk_shared::config::PasswordSettings;
use opsdesk_shared::{JwtConfig, JwtService};
use rstest::rstest;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn test_state() -> AppState {
    AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: Arc::new(JwtService::new(JwtConfig {
            secret: "router-test-secret".to_string(),
            expires_in_hours: 1,
        })),
        password_policy: password_policy(&PasswordSettings::default()),
    }
}

fn app() -> Router {
    create_router(test_state())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_database_down() {
    let (status, body) = send(app(), get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["state"], "degraded");
    assert_eq!(body["data"]["database"], "down");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (status, body) = send(app(), get("/api/v1/Projects")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["data"]["code"], "UNAUTHORIZED");
}

#[rstest]
#[case("/api/v1/Companies")]
#[case("/api/v1/Contacts")]
#[case("/api/v1/Tasks")]
#[case("/api/v1/Timesheets")]
#[case("/api/v1/SalesOrders")]
#[case("/api/v1/Invoices")]
#[case("/api/v1/PurchaseOrders")]
#[case("/api/v1/VendorBills")]
#[case("/api/v1/Expenses")]
#[case("/api/v1/Auth/me")]
#[case("/api/v1/Auth/users")]
#[case("/api/v1/Analytics/dashboard")]
#[tokio::test]
async fn test_every_collection_is_protected(#[case] path: &str) {
    let (status, _) = send(app(), get(path)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let request = Request::builder()
        .uri("/api/v1/Contacts")
        .header(AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or malformed token");
}

#[tokio::test]
async fn test_store_failure_is_generic() {
    let state = test_state();
    let token = state
        .jwt_service
        .generate_token(Uuid::new_v4(), "ada@example.com", "admin")
        .unwrap();
    let request = Request::builder()
        .uri("/api/v1/Contacts")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(create_router(state), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert_eq!(body["data"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "An internal error occurred");
    assert_eq!(body["data"]["errors"], Value::Null);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let (status, body) = send(app(), get("/api/v1/Nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["data"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_signup_validation_names_fields() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/Auth/signup")
        .header("Content-Type", "application/json")
        .body(Body::from(
            r#"{"company_name":"","name":"Ada","email":"nope","password":"short"}"#,
        ))
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["data"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["company_name", "email", "password"]);
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/Auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
    assert_eq!(body["data"]["code"], "BAD_REQUEST");
}
