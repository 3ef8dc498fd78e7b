use crate::error::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Map an application error to its HTTP status and client-facing message.
pub fn map_error(err: &AppError) -> (StatusCode, String) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string())
}

pub fn into_response(err: AppError) -> Response {
    let (status, message) = map_error(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
}
