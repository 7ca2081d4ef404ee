use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::errors::missing_parameter;
use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub product_name: Option<String>,
    /// Accepted for compatibility; not used by any site yet
    pub location: Option<String>,
}

pub async fn search(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(product_name) = params
        .product_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    else {
        return missing_parameter("product_name");
    };

    if let Some(location) = params.location.as_deref() {
        debug!("Ignoring location {:?}", location);
    }

    info!("Search request for {:?}", product_name);
    let report = state.orchestrator.search(product_name).await;
    if report.all_failed() {
        warn!("Every site failed for {:?}", product_name);
    }

    Json(report.products).into_response()
}

pub async fn health(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sites": state.orchestrator.registry().names(),
    }))
}
