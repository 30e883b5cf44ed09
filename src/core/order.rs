//! Order business logic - Validation, pricing and the order workflows.
//!
//! A user has at most one order per event; the `orders` table carries a unique
//! index on (`user`, `event`) and the create workflow checks for an existing
//! order before inserting. Every write works against the active event and
//! bumps the `orders` tracking entry in the same transaction.
//!
//! Reads are always scoped to the requesting user.

use crate::{
    core::{
        event::get_active_event,
        json_type_name, new_uuid, parse_uuid,
        product::get_products_by_uuids,
        tracking::{self, TrackedTable},
    },
    entities::{Order, StringList, event, order},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Message for edit/delete/read-current without an order
const NO_CURRENT_ORDER: &str = "No order for current event exists, use /order/add instead.";

/// An order request that passed validation and pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedOrder {
    /// Product uuids in submission order
    pub products: Vec<String>,
    /// Notes, if any
    pub notes: Option<String>,
    /// Sum of the listed products' prices
    pub total_price: f64,
}

/// The fields echoed back after a create or edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderEcho {
    /// Product uuids in submission order
    pub products: Vec<String>,
    /// Uuid of the event the order belongs to
    pub event: String,
    /// Notes, if any
    pub notes: Option<String>,
    /// Total price
    pub price: f64,
}

impl From<&order::Model> for OrderEcho {
    fn from(value: &order::Model) -> Self {
        Self {
            products: value.products.as_slice().to_vec(),
            event: value.event.clone(),
            notes: value.notes.clone(),
            price: value.total_price,
        }
    }
}

fn request_fields(payload: &Value) -> Result<&Map<String, Value>> {
    payload.as_object().ok_or_else(|| Error::InvalidType {
        message: format!("Expected object, instead got {}", json_type_name(payload)),
    })
}

/// Reads the `products` field: it must be a list of strings.
fn product_list(fields: &Map<String, Value>) -> Result<Vec<String>> {
    let raw = fields.get("products").unwrap_or(&Value::Null);
    let Value::Array(items) = raw else {
        return Err(Error::InvalidType {
            message: format!("Expected list, instead got {}", json_type_name(raw)),
        });
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(uuid) => Ok(uuid.clone()),
            other => Err(Error::InvalidType {
                message: format!("Field <{other}> in product list is not str"),
            }),
        })
        .collect()
}

/// Reads the optional `notes` field: absent, null or a string.
fn notes(fields: &Map<String, Value>) -> Result<Option<String>> {
    match fields.get("notes") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(notes)) => Ok(Some(notes.clone())),
        Some(other) => Err(Error::InvalidType {
            message: format!("Expected string, instead got {}", json_type_name(other)),
        }),
    }
}

/// Sums the prices of `products` in list order; a repeated uuid is priced
/// once per occurrence.
///
/// # Errors
/// Returns [`Error::UnknownProductReference`] for the first uuid, in list
/// order, that does not resolve.
pub async fn price_products<C>(db: &C, products: &[String]) -> Result<f64>
where
    C: ConnectionTrait,
{
    let catalog = get_products_by_uuids(db, products).await?;
    products.iter().try_fold(0.0, |total, uuid| {
        catalog
            .get(uuid)
            .map(|product| total + product.price)
            .ok_or_else(|| Error::UnknownProductReference { uuid: uuid.clone() })
    })
}

/// Checks `total` against the event's ceiling. A total equal to the ceiling
/// is accepted.
///
/// # Errors
/// Returns [`Error::PriceExceeded`] carrying the ceiling.
pub fn check_ceiling(total: f64, event: &event::Model) -> Result<()> {
    if total > event.max_order_price {
        return Err(Error::PriceExceeded {
            maximum: event.max_order_price,
            total,
        });
    }
    Ok(())
}

/// Validates and prices an order request against `event`.
///
/// Fails on the first violation, in this order: `products` is not a list of
/// strings, a product does not resolve, `notes` is not a string, the total
/// is above the ceiling. Nothing is written.
pub async fn validate_order<C>(db: &C, event: &event::Model, payload: &Value) -> Result<PricedOrder>
where
    C: ConnectionTrait,
{
    let fields = request_fields(payload)?;
    let products = product_list(fields)?;
    let total_price = price_products(db, &products).await?;
    let notes = notes(fields)?;
    check_ceiling(total_price, event)?;

    Ok(PricedOrder {
        products,
        notes,
        total_price,
    })
}

async fn find_user_order<C>(db: &C, user_uuid: &str, event_uuid: &str) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::User.eq(user_uuid))
        .filter(order::Column::Event.eq(event_uuid))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Places a new order for `user_uuid` in the active event. Bumps `orders`.
///
/// # Errors
/// - [`Error::NoActiveEvent`] when no event is active
/// - [`Error::OrderExists`] when the user already ordered for this event,
///   whether found up front or reported by the unique index on insert
/// - validation errors from [`validate_order`]
pub async fn create_order(
    db: &DatabaseConnection,
    user_uuid: &str,
    payload: &Value,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let event = get_active_event(&txn).await?;

    if let Some(existing) = find_user_order(&txn, user_uuid, &event.uuid).await? {
        return Err(Error::OrderExists {
            uuid: existing.uuid,
        });
    }

    let priced = validate_order(&txn, &event, payload).await?;
    let now = Utc::now();
    let inserted = order::ActiveModel {
        uuid: Set(new_uuid()),
        user: Set(user_uuid.to_string()),
        event: Set(event.uuid.clone()),
        products: Set(StringList(priced.products)),
        total_price: Set(priced.total_price),
        notes: Set(priced.notes),
        created_at: Set(now),
        last_changed_at: Set(now),
        expired: Set(false),
        completed: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await;

    let created = match inserted.map_err(Error::from_insert) {
        Ok(created) => created,
        Err(Error::UniqueViolation { constraint, .. }) => {
            warn!(
                "Concurrent order for user {} in event {} ({})",
                user_uuid, event.uuid, constraint
            );
            let uuid = find_user_order(&txn, user_uuid, &event.uuid)
                .await?
                .map(|existing| existing.uuid)
                .unwrap_or_default();
            return Err(Error::OrderExists { uuid });
        }
        Err(e) => return Err(e),
    };

    tracking::mark_changed(&txn, TrackedTable::Orders).await?;
    txn.commit().await?;

    info!(
        "Created order {} for user {} (total {})",
        created.uuid, user_uuid, created.total_price
    );
    Ok(created)
}

/// Replaces the product list, notes and price of the user's order in the
/// active event. Bumps `orders`.
///
/// # Errors
/// - [`Error::NoActiveEvent`] when no event is active
/// - [`Error::OrderNotFound`] when there is no order to edit
/// - validation errors from [`validate_order`]
pub async fn edit_order(
    db: &DatabaseConnection,
    user_uuid: &str,
    payload: &Value,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let event = get_active_event(&txn).await?;

    let existing = find_user_order(&txn, user_uuid, &event.uuid)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            context: NO_CURRENT_ORDER.to_string(),
        })?;

    let priced = validate_order(&txn, &event, payload).await?;
    let mut active: order::ActiveModel = existing.into();
    active.products = Set(StringList(priced.products));
    active.total_price = Set(priced.total_price);
    active.notes = Set(priced.notes);
    active.last_changed_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    tracking::mark_changed(&txn, TrackedTable::Orders).await?;
    txn.commit().await?;

    info!(
        "Edited order {} for user {} (total {})",
        updated.uuid, user_uuid, updated.total_price
    );
    Ok(updated)
}

/// Removes the user's order in the active event, returning its uuid. Bumps
/// `orders`.
///
/// # Errors
/// - [`Error::NoActiveEvent`] when no event is active
/// - [`Error::OrderNotFound`] when there is no order to delete
pub async fn delete_order(db: &DatabaseConnection, user_uuid: &str) -> Result<String> {
    let txn = db.begin().await?;
    let event = get_active_event(&txn).await?;

    let existing = find_user_order(&txn, user_uuid, &event.uuid)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            context: NO_CURRENT_ORDER.to_string(),
        })?;

    let uuid = existing.uuid.clone();
    existing.delete(&txn).await?;

    tracking::mark_changed(&txn, TrackedTable::Orders).await?;
    txn.commit().await?;

    info!("Deleted order {} for user {}", uuid, user_uuid);
    Ok(uuid)
}

/// The user's order in the active event.
///
/// # Errors
/// [`Error::NoActiveEvent`] when no event is active, [`Error::OrderNotFound`]
/// when the user has not ordered.
pub async fn get_current_order(db: &DatabaseConnection, user_uuid: &str) -> Result<order::Model> {
    let event = get_active_event(db).await?;
    find_user_order(db, user_uuid, &event.uuid)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            context: NO_CURRENT_ORDER.to_string(),
        })
}

/// One of the user's orders by its uuid.
///
/// Another user's order is reported as not found.
pub async fn get_order_by_uuid(
    db: &DatabaseConnection,
    user_uuid: &str,
    uuid: &str,
) -> Result<order::Model> {
    parse_uuid(uuid)?;
    Order::find()
        .filter(order::Column::Uuid.eq(uuid))
        .filter(order::Column::User.eq(user_uuid))
        .one(db)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            context: format!("Order <{uuid}> not found"),
        })
}

/// The user's order for a given event.
pub async fn get_order_by_event(
    db: &DatabaseConnection,
    user_uuid: &str,
    event_uuid: &str,
) -> Result<order::Model> {
    parse_uuid(event_uuid)?;
    find_user_order(db, user_uuid, event_uuid)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            context: format!("No order for event <{event_uuid}> exists"),
        })
}

/// Every order the user has placed, oldest first. May be empty.
pub async fn get_orders_for_user(
    db: &DatabaseConnection,
    user_uuid: &str,
) -> Result<Vec<order::Model>> {
    let orders = Order::find()
        .filter(order::Column::User.eq(user_uuid))
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await?;
    debug!("Found {} orders for user {}", orders.len(), user_uuid);
    Ok(orders)
}
