//! HTTP service boundary
//!
//! `GET /search` runs a search across every registered site and answers with
//! the merged, price-sorted product list. `GET /health` reports liveness and
//! the registered sites.

pub mod errors;
pub mod routes;

use axum::error_handling::HandleErrorLayer;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{BoxError, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

use crate::crawling::SearchOrchestrator;
use errors::json_error;

/// Slack added on top of the search deadline before a request is abandoned
pub const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(15);

/// Shared state handed to every handler
pub struct AppState {
    pub orchestrator: SearchOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: SearchOrchestrator) -> Self {
        Self { orchestrator }
    }
}

/// Build the service router.
///
/// When the orchestrator has a search deadline, requests are also bounded by
/// that deadline plus [`REQUEST_TIMEOUT_GRACE`].
pub fn build_router(state: Arc<AppState>) -> Router {
    let request_timeout = state
        .orchestrator
        .config()
        .global_timeout
        .map(|deadline| deadline + REQUEST_TIMEOUT_GRACE);

    let router = Router::new()
        .route("/search", get(routes::search))
        .route("/health", get(routes::health))
        .layer(Extension(state));

    match request_timeout {
        Some(limit) => router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(limit),
        ),
        None => router,
    }
}

async fn handle_timeout(error: BoxError) -> axum::response::Response {
    if error.is::<tower::timeout::error::Elapsed>() {
        json_error(
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            "search did not finish in time",
        )
    } else {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            error.to_string(),
        )
    }
}
