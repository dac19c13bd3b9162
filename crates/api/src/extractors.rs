//! Request extractors that report malformed input through the error envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use opsdesk_shared::AppError;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that is deserialized and then validated.
///
/// Malformed JSON and failed validation both become 422 responses.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError(AppError::BadRequest(rejection.body_text())))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string with 422 on malformed values.
#[derive(Debug, Clone)]
pub struct ListQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ListQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError(AppError::BadRequest(rejection.body_text())))?;
        Ok(Self(value))
    }
}

/// The `{uuid}` path segment of an entity route.
///
/// A segment that is not a UUID cannot name any entity, so it is a 404.
#[derive(Debug, Clone, Copy)]
pub struct EntityId(pub Uuid);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(uuid) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found("Resource not found"))?;
        Ok(Self(uuid))
    }
}

/// Deserializes a patch field where `null` differs from absent.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`: an absent
/// field stays `None`, `null` becomes `Some(None)`, a value `Some(Some(v))`.
///
/// # Errors
///
/// Returns the inner deserializer's error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
