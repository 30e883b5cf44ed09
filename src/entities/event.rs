//! Event entity - A time-boxed ordering window.
//!
//! Orders are always placed against the event flagged `active`. The event's
//! `max_order_price` is the ceiling every order total is checked against.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Internal identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Public identifier, referenced by orders
    #[sea_orm(unique)]
    pub uuid: String,
    /// Whether this is the current ordering window
    pub active: bool,
    /// When the event was created
    pub created_at: DateTimeUtc,
    /// When the event ends
    pub until: DateTimeUtc,
    /// Order cutoff
    pub deadline: DateTimeUtc,
    /// Maximum total price a single order may have
    pub max_order_price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
