/// Catalog feed loading and the populate workflow
pub mod catalog;

/// Event lookups, creation and activation
pub mod event;

/// Order validation, pricing and the create/edit/delete workflows
pub mod order;

/// Product lookups and removal
pub mod product;

/// Per-table change tracking
pub mod tracking;

/// User accounts, activity stamping and the bootstrap administrator
pub mod user;

use crate::errors::{Error, Result};
use serde_json::Value;
use uuid::Uuid;

/// Checks that `value` is a well-formed UUID, returning it unchanged.
///
/// Lookups by uuid run this first so a malformed path parameter is reported
/// as a client error instead of a miss.
pub(crate) fn parse_uuid(value: &str) -> Result<&str> {
    Uuid::parse_str(value)
        .map(|_| value)
        .map_err(|_| Error::InvalidUuid {
            value: value.to_string(),
        })
}

/// Fresh random identifier in its hyphenated text form.
pub(crate) fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Name of a JSON value's type, used in invalid-type messages.
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
