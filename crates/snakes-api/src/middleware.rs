//! Last-resort handlers: unmatched routes and panics escaping a handler.

use std::any::Any;

use axum::response::{IntoResponse, Response};
use snakes_common::error::ApiError;

/// Fallback for every path no route matched.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Response for a panic caught by `CatchPanicLayer`.
///
/// Builds the body from a fixed error variant, so producing it cannot panic again.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "handler panicked".to_owned()
    };

    ApiError::Internal { message }.into_response()
}
