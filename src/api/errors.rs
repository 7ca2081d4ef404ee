use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;

/// JSON error body: `{"error": <code>, "message": <text>}`
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn missing_parameter(name: &str) -> axum::response::Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "missing_parameter",
        format!("'{name}' query parameter is required."),
    )
}
