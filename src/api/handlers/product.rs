//! Catalog reads.

use crate::{
    api::{ApiResponse, AppState},
    core::{
        product,
        tracking::{self, TrackedTable},
    },
    errors::{Error, Result},
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::to_value;

/// `GET /product/all`
pub async fn all(State(state): State<AppState>) -> Result<ApiResponse> {
    let products = product::get_all_products(&state.db).await?;
    if products.is_empty() {
        return Err(Error::ProductNotFound {
            context: "No products exist".to_string(),
        });
    }
    Ok(ApiResponse::result(
        StatusCode::OK,
        format!("Found {} products", products.len()),
        to_value(products)?,
    ))
}

/// `GET /product/{uuid}`
pub async fn by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<ApiResponse> {
    let found = product::get_product_by_uuid(&state.db, &uuid).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "Product found",
        to_value(found)?,
    ))
}

/// `GET /product/last_changed`
pub async fn last_changed(State(state): State<AppState>) -> Result<ApiResponse> {
    let entry = tracking::read_table(&state.db, TrackedTable::Products).await?;
    Ok(ApiResponse::result(
        StatusCode::OK,
        "Last changed",
        to_value(entry)?,
    ))
}
