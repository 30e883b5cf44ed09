//! Service-level routes.

use crate::{
    api::{ApiResponse, AppState},
    core::tracking,
    errors::Result,
};
use axum::{extract::State, http::StatusCode};
use serde_json::{json, to_value};

/// `GET /health`
pub async fn health() -> ApiResponse {
    ApiResponse::message(StatusCode::OK, "ok")
}

/// `GET /version`
pub async fn version(State(state): State<AppState>) -> ApiResponse {
    ApiResponse::result(
        StatusCode::OK,
        "ok",
        json!({ "version": state.config.server.version }),
    )
}

/// `GET /last_changed`
pub async fn last_changed(State(state): State<AppState>) -> Result<ApiResponse> {
    let summary = tracking::read(&state.db).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "Last changed",
        to_value(summary)?,
    ))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiResponse {
    ApiResponse::message(StatusCode::NOT_FOUND, "Not found")
}
