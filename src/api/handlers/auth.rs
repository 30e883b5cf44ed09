//! Login and identity checks.

use crate::{
    api::{ApiResponse, AppState, handlers::json_body},
    auth::{ClientIp, CurrentUser},
    core::{json_type_name, user},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::info;

fn string_field(payload: &Value, field: &str) -> Result<String> {
    match payload.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        other => Err(Error::InvalidType {
            message: format!(
                "Expected str, instead got {}",
                json_type_name(other.unwrap_or(&Value::Null))
            ),
        }),
    }
}

/// `POST /auth/login`
///
/// Exchanges `{username, password}` for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<ApiResponse> {
    let payload = json_body(payload)?;
    let username = string_field(&payload, "username")?;
    let password = string_field(&payload, "password")?;

    let account = user::authenticate(&state.db, &username, &password).await?;
    let token = state.jwt.generate_token(&account)?;
    let account = user::record_login(&state.db, account, ip).await?;

    info!("User {} logged in", account.username);
    Ok(ApiResponse::details(
        StatusCode::OK,
        format!("Successfully logged in as {}", account.username),
        json!({
            "login": {
                "uuid": account.uuid,
                "token": token,
                "lifetime": state.jwt.lifetime().num_seconds(),
            }
        }),
    ))
}

/// `GET /auth/test`
pub async fn test(current: CurrentUser) -> ApiResponse {
    ApiResponse::details(
        StatusCode::OK,
        format!("Logged in as {}", current.username),
        json!({ "login": { "uuid": current.uuid } }),
    )
}

/// `GET /auth/admin/test`
pub async fn admin_test(current: CurrentUser) -> ApiResponse {
    ApiResponse::details(
        StatusCode::OK,
        format!("Logged in as administrator {}", current.username),
        json!({ "login": { "uuid": current.uuid } }),
    )
}
