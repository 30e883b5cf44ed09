//! Route handlers, one module per resource.
//!
//! Handlers receive the caller as [`crate::auth::CurrentUser`] when mounted
//! behind the gate; which gate applies is decided in
//! [`crate::api::build_router`].

pub mod admin;
pub mod auth;
pub mod event;
pub mod generics;
pub mod order;
pub mod product;
pub mod user;

use crate::errors::{Error, Result};
use axum::{Json, extract::rejection::JsonRejection};
use serde_json::Value;

/// Unwraps a JSON body, turning a missing or malformed body into a 400.
pub(crate) fn json_body(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::InvalidType {
            message: rejection.body_text(),
        })
}
