//! Unified error types and result handling.
//!
//! Every failure the service can report is a variant of [`Error`]. Client
//! input errors, state-precondition errors and authorization errors each map
//! to a distinct HTTP status in [`crate::api::response`]; storage and I/O
//! failures are rendered as a generic internal error.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any failure reported by the ORM or the storage engine
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure (catalog feed, credential file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a file we were asked to load
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request body has the wrong shape or a field has the wrong type
    #[error("{message}")]
    InvalidType {
        /// Human-readable description of the offending field
        message: String,
    },

    /// A path parameter that should be a UUID is not one
    #[error("Given value is not a UUID: {value}")]
    InvalidUuid {
        /// The rejected value
        value: String,
    },

    /// A product uuid in an order does not resolve to a catalog entry
    #[error("Product <{uuid}> was not found")]
    UnknownProductReference {
        /// The unresolved product uuid
        uuid: String,
    },

    /// No product matches the lookup
    #[error("{context}")]
    ProductNotFound {
        /// What was looked up
        context: String,
    },

    /// The order total is above the active event's ceiling
    #[error("Price exceeded maximum: <{maximum}>")]
    PriceExceeded {
        /// The active event's `max_order_price`
        maximum: f64,
        /// The computed total that was rejected
        total: f64,
    },

    /// An order already exists for this user and the active event
    #[error("Order for current event already exists")]
    OrderExists {
        /// Uuid of the existing order
        uuid: String,
    },

    /// No order matches the lookup
    #[error("{context}")]
    OrderNotFound {
        /// What was looked up
        context: String,
    },

    /// No event has `active = true`
    #[error("No current event exists")]
    NoActiveEvent,

    /// No event matches the lookup
    #[error("{context}")]
    EventNotFound {
        /// What was looked up
        context: String,
    },

    /// No user matches the lookup
    #[error("{context}")]
    UserNotFound {
        /// What was looked up
        context: String,
    },

    /// Unknown change-tracking table name
    #[error("Invalid tracked table: {name}")]
    InvalidTable {
        /// The rejected table name
        name: String,
    },

    /// An insert hit a unique constraint
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Raw storage message
        message: String,
        /// The constraint (table.column) that was violated
        constraint: String,
    },

    /// Missing, expired or otherwise unusable credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Username/password pair did not match
    #[error("Unauthorized, wrong username/password")]
    InvalidCredentials,

    /// Authenticated but not allowed
    #[error("Forbidden, no rights to access admin resources")]
    Forbidden,

    /// Token signing or decoding failed for a reason other than bad input
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Underlying hasher message
        message: String,
    },
}

impl Error {
    /// Converts a failed insert, turning unique-constraint failures into
    /// [`Error::UniqueViolation`] and passing everything else through.
    #[must_use]
    pub fn from_insert(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => {
                // SQLite reports "UNIQUE constraint failed: users.email"
                let constraint = message
                    .rsplit(": ")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Self::UniqueViolation {
                    message,
                    constraint,
                }
            }
            _ => Self::Database(err),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash {
            message: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Self::Config {
            message: format!("Failed to parse config file: {value}"),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
