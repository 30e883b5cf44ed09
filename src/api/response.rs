//! Response envelope
//!
//! Every response, success or failure, has the shape
//! `{"status": <int>, "message": <string>, "result"|"details": <payload>}`
//! where `status` repeats the HTTP status code.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use tracing::{error, warn};

/// JSON envelope returned by every route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// HTTP status, repeated in the body
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    /// Human-readable summary
    pub message: String,
    /// Requested data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Outcome details of a mutation or failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

impl ApiResponse {
    /// Envelope with only a message.
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            result: None,
            details: None,
        }
    }

    /// Envelope carrying requested data under `result`.
    pub fn result(status: StatusCode, message: impl Into<String>, result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::message(status, message)
        }
    }

    /// Envelope carrying an outcome under `details`.
    pub fn details(status: StatusCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            details: Some(details),
            ..Self::message(status, message)
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<&Error> for ApiResponse {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidType { .. } | Error::UnknownProductReference { .. } => Self::details(
                StatusCode::BAD_REQUEST,
                "Bad request, see details.",
                json!({ "error": err.to_string() }),
            ),
            Error::PriceExceeded { maximum, total } => Self::details(
                StatusCode::BAD_REQUEST,
                "Bad request, see details.",
                json!({ "error": err.to_string(), "maximum": maximum, "total": total }),
            ),
            Error::InvalidUuid { .. } => Self::message(
                StatusCode::BAD_REQUEST,
                "Bad request, given value is not a UUID.",
            ),
            Error::InvalidTable { .. } => Self::message(StatusCode::BAD_REQUEST, err.to_string()),
            Error::UniqueViolation {
                message,
                constraint,
            } => Self::details(
                StatusCode::BAD_REQUEST,
                "Bad request, check details for more info",
                json!({ "error": message, "constraint": constraint }),
            ),
            Error::OrderExists { uuid } => Self::details(
                StatusCode::CONFLICT,
                "Order for current event already exists, use /order/edit instead.",
                json!({ "uuid": uuid }),
            ),
            Error::OrderNotFound { .. }
            | Error::EventNotFound { .. }
            | Error::ProductNotFound { .. }
            | Error::UserNotFound { .. } => Self::message(StatusCode::NOT_FOUND, err.to_string()),
            Error::NoActiveEvent => Self::message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "No current event exists.",
            ),
            Error::Unauthorized | Error::InvalidCredentials => {
                Self::message(StatusCode::UNAUTHORIZED, err.to_string())
            }
            Error::Forbidden => Self::message(StatusCode::FORBIDDEN, err.to_string()),
            Error::Config { .. }
            | Error::Database(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Token(_)
            | Error::PasswordHash { .. } => Self::message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let response = ApiResponse::from(&self);
        if response.status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", response.status, self);
        }
        response.into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_envelope_omits_empty_payloads() {
        let body = serde_json::to_value(ApiResponse::message(StatusCode::OK, "ok")).unwrap();
        assert_eq!(body, json!({"status": 200, "message": "ok"}));

        let body = serde_json::to_value(ApiResponse::result(
            StatusCode::OK,
            "Found",
            json!([1, 2]),
        ))
        .unwrap();
        assert_eq!(body, json!({"status": 200, "message": "Found", "result": [1, 2]}));
    }

    #[test]
    fn test_error_statuses() {
        let cases = [
            (
                Error::InvalidType {
                    message: "x".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::UnknownProductReference {
                    uuid: "p".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::PriceExceeded {
                    maximum: 20.0,
                    total: 20.01,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::OrderExists {
                    uuid: "o".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::OrderNotFound {
                    context: "none".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::NoActiveEvent, StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Unauthorized, StatusCode::UNAUTHORIZED),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::Forbidden, StatusCode::FORBIDDEN),
        ];

        for (err, status) in cases {
            assert_eq!(ApiResponse::from(&err).status, status, "{err}");
        }
    }

    #[test]
    fn test_internal_errors_are_not_exposed() {
        let err = Error::Config {
            message: "secret path /etc/app".to_string(),
        };
        let response = ApiResponse::from(&err);
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.message, "Internal server error");
        assert!(response.details.is_none());
    }

    #[test]
    fn test_conflict_carries_existing_uuid() {
        let response = ApiResponse::from(&Error::OrderExists {
            uuid: "abc".to_string(),
        });
        assert_eq!(response.details, Some(json!({"uuid": "abc"})));
    }
}
