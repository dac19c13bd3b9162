//! Success envelope: `{status, message, data, pager?}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opsdesk_shared::types::{PageRequest, Pager, Paged};
use serde::Serialize;

/// Body of every successful response.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// HTTP status code of the response.
    pub status: u16,
    /// Human-readable summary.
    pub message: String,
    /// Payload.
    pub data: T,
    /// Pagination metadata on list responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<Pager>,
}

fn respond<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
    pager: Option<Pager>,
) -> Response {
    let body = Envelope {
        status: status.as_u16(),
        message: message.into(),
        data,
        pager,
    };
    (status, Json(body)).into_response()
}

/// 200 with a payload.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::OK, message, data, None)
}

/// 201 with the created entity.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::CREATED, message, data, None)
}

/// 200 with `{rows, total_count}` and pager metadata.
pub fn page<T: Serialize>(message: impl Into<String>, rows: Paged<T>, request: PageRequest) -> Response {
    let pager = Pager::new(request, rows.total_count);
    respond(StatusCode::OK, message, rows, Some(pager))
}

/// 200 with a null payload.
pub fn deleted(message: impl Into<String>) -> Response {
    respond(StatusCode::OK, message, serde_json::Value::Null, None)
}
