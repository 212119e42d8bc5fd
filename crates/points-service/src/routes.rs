//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, points};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// Only the read routes are bounded by the request timeout.
///
/// - `GET /health` - Health check
/// - `GET /point/:id` - Current balance
/// - `GET /point/:id/histories` - Charge/use history, oldest first
/// - `PATCH /point/:id/charge` - Charge points, body `{"amount": n}`
/// - `PATCH /point/:id/use` - Use points, body `{"amount": n}`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Charge and use are not timed out: a timeout cannot cancel a ledger call
    // that has already started on the blocking pool.
    let reads = Router::new()
        .route("/health", get(health::health))
        .route("/point/:id", get(points::get_point))
        .route("/point/:id/histories", get(points::list_histories))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )));

    let mutations = Router::new()
        .route("/point/:id/charge", patch(points::charge))
        .route("/point/:id/use", patch(points::use_points));

    Router::new()
        .merge(reads)
        .merge(mutations)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
