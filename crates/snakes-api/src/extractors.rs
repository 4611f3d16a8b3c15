//! Custom Axum extractors

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use snakes_common::error::ApiError;

/// Raw `{id}` path segment. The store decides what it matches, so no parsing
/// happens here; only a segment that is not valid UTF-8 is refused.
pub struct SnakeId(pub String);

impl<S> FromRequestParts<S> for SnakeId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest {
                message: rejection.body_text(),
            })?;
        Ok(Self(id))
    }
}
