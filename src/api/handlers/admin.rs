//! Administrator routes: catalog, accounts and events.

use crate::{
    api::{ApiResponse, AppState, handlers::json_body},
    core::{
        catalog,
        event::{self, NewEvent},
        product,
        user::{self, NewUser},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json, to_value};

/// `GET /admin/product/populate`
///
/// Replaces the catalog with the configured feed file.
pub async fn populate_products(State(state): State<AppState>) -> Result<ApiResponse> {
    let entries = catalog::load_feed(&state.config.catalog.path)?;
    let summary = catalog::populate(&state.db, entries).await?;
    Ok(ApiResponse::details(
        StatusCode::OK,
        format!(
            "Successfully repopulated {} products in {}ms",
            summary.count, summary.elapsed_ms
        ),
        json!({
            "count": summary.count,
            "time": format!("{}ms", summary.elapsed_ms),
        }),
    ))
}

/// `DELETE /admin/product/delete/{uuid}`
pub async fn delete_product(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse> {
    let uuid = product::delete_product(&state.db, &uuid).await?;
    Ok(ApiResponse::details(
        StatusCode::OK,
        "Successfully deleted 1 product",
        json!({ "uuid": uuid }),
    ))
}

/// `POST /admin/user/add`
///
/// Creates an account with a generated password and returns the password
/// once.
pub async fn add_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse> {
    let new_user = NewUser::from_json(&json_body(payload)?)?;
    let (created, password) =
        user::create_user_with_generated_password(&state.db, new_user, &state.config.security)
            .await?;
    Ok(ApiResponse::details(
        StatusCode::CREATED,
        format!("Successfully created user {}", created.username),
        json!({ "login": { "uuid": created.uuid, "password": password } }),
    ))
}

/// `DELETE /admin/user/delete/{uuid}`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse> {
    let uuid = user::delete_user(&state.db, &uuid).await?;
    Ok(ApiResponse::details(
        StatusCode::OK,
        "Successfully deleted 1 user",
        json!({ "uuid": uuid }),
    ))
}

/// `POST /admin/event/add`
pub async fn add_event(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse> {
    let new_event = NewEvent::from_json(&json_body(payload)?)?;
    let created = event::create_event(&state.db, new_event, &state.config.events).await?;
    Ok(ApiResponse::result(
        StatusCode::CREATED,
        "Successfully created event",
        to_value(created)?,
    ))
}

/// `PUT /admin/event/activate/{uuid}`
pub async fn activate_event(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse> {
    let activated = event::activate_event(&state.db, &uuid, &state.config.events).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        format!("Successfully activated event {}", activated.uuid),
        to_value(activated)?,
    ))
}
