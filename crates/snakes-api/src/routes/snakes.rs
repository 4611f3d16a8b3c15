//! Snake routes: list the table, fetch one row by id.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use snakes_common::error::{ApiError, ApiResult};
use snakes_db::{JsonRow, repository::snakes};
use std::sync::Arc;

use crate::AppState;
use crate::extractors::SnakeId;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/snakes", get(list_snakes))
        .route("/snakes/{id}", get(get_snake))
}

/// GET /api/snakes: every row, in the store's order.
async fn list_snakes(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<JsonRow>>> {
    match snakes::list_all(&state.db).await {
        Ok(rows) => Ok(Json(rows)),
        Err(failure) => Err(state.query_failed(failure).await),
    }
}

/// GET /api/snakes/{id}: the matching row, or 404.
async fn get_snake(
    State(state): State<Arc<AppState>>,
    SnakeId(id): SnakeId,
) -> ApiResult<Json<JsonRow>> {
    match snakes::find_by_id(&state.db, &id).await {
        Ok(Some(row)) => Ok(Json(row)),
        Ok(None) => Err(ApiError::NotFound { resource: "Snake" }),
        Err(failure) => Err(state.query_failed(failure).await),
    }
}
