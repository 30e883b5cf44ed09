//! The caller's orders.
//!
//! Every route here works on the requesting user's own orders only.

use crate::{
    api::{ApiResponse, AppState, handlers::json_body},
    auth::CurrentUser,
    core::{
        order::{self, OrderEcho},
        tracking::{self, TrackedTable},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json, to_value};

/// `GET /order/current`
pub async fn current(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<ApiResponse> {
    let found = order::get_current_order(&state.db, &current.uuid).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "Current order",
        to_value(found)?,
    ))
}

/// `GET /order/{uuid}`
pub async fn by_uuid(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(uuid): Path<String>,
) -> Result<ApiResponse> {
    let found = order::get_order_by_uuid(&state.db, &current.uuid, &uuid).await?;
    Ok(ApiResponse::result(StatusCode::OK, "Order found", to_value(found)?))
}

/// `GET /order/event/{uuid}`
pub async fn by_event(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(event_uuid): Path<String>,
) -> Result<ApiResponse> {
    let found = order::get_order_by_event(&state.db, &current.uuid, &event_uuid).await?;
    Ok(ApiResponse::result(StatusCode::OK, "Order found", to_value(found)?))
}

/// `GET /order/all`
pub async fn all(State(state): State<AppState>, current: CurrentUser) -> Result<ApiResponse> {
    let orders = order::get_orders_for_user(&state.db, &current.uuid).await?;
    if orders.is_empty() {
        return Err(Error::OrderNotFound {
            context: "No orders exist for this user".to_string(),
        });
    }
    Ok(ApiResponse::result(
        StatusCode::OK,
        format!("Found {} orders", orders.len()),
        to_value(orders)?,
    ))
}

/// `GET /order/last_changed`
pub async fn last_changed(State(state): State<AppState>) -> Result<ApiResponse> {
    let entry = tracking::read_table(&state.db, TrackedTable::Orders).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "Last changed",
        to_value(entry)?,
    ))
}

/// `POST /order/add`
pub async fn add(
    State(state): State<AppState>,
    current: CurrentUser,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse> {
    let payload = json_body(payload)?;
    let created = order::create_order(&state.db, &current.uuid, &payload).await?;
    Ok(ApiResponse::details(
        StatusCode::CREATED,
        "Successfully created new order",
        json!({ "order": OrderEcho::from(&created) }),
    ))
}

/// `PUT /order/edit`
pub async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse> {
    let payload = json_body(payload)?;
    let updated = order::edit_order(&state.db, &current.uuid, &payload).await?;
    Ok(ApiResponse::details(
        StatusCode::OK,
        format!("Successfully edited order {}", updated.uuid),
        json!({ "order": OrderEcho::from(&updated) }),
    ))
}

/// `DELETE /order/delete`
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<ApiResponse> {
    let uuid = order::delete_order(&state.db, &current.uuid).await?;
    Ok(ApiResponse::details(
        StatusCode::OK,
        format!("Successfully deleted order {uuid}"),
        json!({ "order": { "uuid": uuid } }),
    ))
}
