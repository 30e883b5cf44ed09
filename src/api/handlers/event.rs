//! Event reads.

use crate::{
    api::{ApiResponse, AppState},
    core::{
        event,
        tracking::{self, TrackedTable},
    },
    errors::{Error, Result},
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::to_value;

/// `GET /event/current`
pub async fn current(State(state): State<AppState>) -> Result<ApiResponse> {
    let active = event::get_active_event(&state.db).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "Current event",
        to_value(active)?,
    ))
}

/// `GET /event/{uuid}`
pub async fn by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse> {
    let found = event::get_event_by_uuid(&state.db, &uuid).await?;
    Ok(ApiResponse::result(StatusCode::OK, "Event found", to_value(found)?))
}

/// `GET /event/all`
pub async fn all(State(state): State<AppState>) -> Result<ApiResponse> {
    let events = event::get_all_events(&state.db).await?;
    if events.is_empty() {
        return Err(Error::EventNotFound {
            context: "No events exist".to_string(),
        });
    }
    Ok(ApiResponse::result(
        StatusCode::OK,
        format!("Found {} events", events.len()),
        to_value(events)?,
    ))
}

/// `GET /event/last_changed`
pub async fn last_changed(State(state): State<AppState>) -> Result<ApiResponse> {
    let entry = tracking::read_table(&state.db, TrackedTable::Events).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "Last changed",
        to_value(entry)?,
    ))
}
