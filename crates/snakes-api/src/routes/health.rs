//! Liveness and database status endpoints. Both always answer 200; a broken
//! database shows up in the body, not the status code.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug, Serialize)]
struct TestResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
    environment: String,
}

#[derive(Debug, Serialize)]
struct DbStatusResponse {
    status: &'static str,
    timestamp: String,
    database_url_set: bool,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test", get(api_test))
        .route("/db-status", get(db_status))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /api/test: answers without touching the database.
async fn api_test(State(state): State<Arc<AppState>>) -> Json<TestResponse> {
    Json(TestResponse {
        status: "OK",
        message: "API is working",
        timestamp: timestamp(),
        environment: state.environment.clone(),
    })
}

/// GET /api/db-status: runs the diagnostic query.
async fn db_status(State(state): State<Arc<AppState>>) -> Json<DbStatusResponse> {
    let connected = state.db.check_health().await;

    Json(DbStatusResponse {
        status: if connected { "connected" } else { "disconnected" },
        timestamp: timestamp(),
        database_url_set: state.database_url_set,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_utc_millis() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        // 2025-01-01T00:00:00.000Z
        assert_eq!(ts.len(), 24);
    }
}
