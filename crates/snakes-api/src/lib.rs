//! # snakes-api
//!
//! REST API layer for the snakes service. Every handler runs exactly one query
//! through [`snakes_db::Database`] and turns the rows, or the failure, into a
//! response.

pub mod extractors;
pub mod middleware;
pub mod routes;

use axum::Router;
use snakes_common::config::AppConfig;
use snakes_common::error::{ApiError, QueryFailure};
use snakes_db::Database;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Deployment label reported by `GET /api/test`.
    pub environment: String,
    /// Whether a connection URI was configured, reported by `GET /api/db-status`.
    pub database_url_set: bool,
    /// Re-run the diagnostic query after a failed request query (log only).
    pub reprobe_on_failure: bool,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        Self {
            db,
            environment: config.server.environment.clone(),
            database_url_set: config.database.url().is_some(),
            reprobe_on_failure: config.database.reprobe_on_failure,
        }
    }

    /// Turn a failed query into a response error. The optional re-probe only
    /// feeds the logs; the response is the same either way.
    pub async fn query_failed(&self, failure: QueryFailure) -> ApiError {
        if self.reprobe_on_failure {
            let reachable = self.db.check_health().await;
            tracing::warn!(reachable, "Re-probed database after failed query");
        }
        ApiError::Query(failure)
    }
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::snakes::router())
        .merge(routes::health::router())
        // A known path with an unsupported method is still "Not found".
        .method_not_allowed_fallback(middleware::not_found);

    Router::new()
        .nest("/api", api_routes)
        .fallback(middleware::not_found)
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
