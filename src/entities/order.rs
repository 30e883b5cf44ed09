//! Order entity - One user's product selection for one event.
//!
//! `products` is a denormalized list of product uuids; a uuid listed twice is
//! two line items. A unique index on (`user`, `event`) is created alongside
//! the table (see [`crate::config::database::create_tables`]).

use super::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Internal identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Public identifier
    #[sea_orm(unique)]
    pub uuid: String,
    /// Uuid of the owning user
    pub user: String,
    /// Uuid of the event this order was placed for
    pub event: String,
    /// Product uuids in the order they were submitted
    #[sea_orm(column_type = "Json")]
    pub products: StringList,
    /// Sum of the listed products' prices at the time of the last write
    pub total_price: f64,
    /// Free-text notes from the user
    pub notes: Option<String>,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last edited
    pub last_changed_at: DateTimeUtc,
    /// Set once the owning event is over
    pub expired: bool,
    /// Set once the order has been handed out
    pub completed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
