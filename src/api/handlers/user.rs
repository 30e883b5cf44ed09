//! Public user profiles.

use crate::{
    api::{ApiResponse, AppState},
    core::user::{self, PublicUser},
    errors::{Error, Result},
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::to_value;

/// `GET /user/all`
pub async fn all(State(state): State<AppState>) -> Result<ApiResponse> {
    let users = user::get_all_users(&state.db).await?;
    if users.is_empty() {
        return Err(Error::UserNotFound {
            context: "No users exist".to_string(),
        });
    }
    let public: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(ApiResponse::result(
        StatusCode::OK,
        format!("Found {} users", public.len()),
        to_value(public)?,
    ))
}

/// `GET /user/{uuid}`
pub async fn by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse> {
    let found = user::get_user_by_uuid(&state.db, &uuid).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "User found",
        to_value(PublicUser::from(&found))?,
    ))
}
