//! Change-tracking entity - one row per tracked table.
//!
//! Clients poll these rows to learn whether a table changed since they last
//! looked. `version` only ever increases and is bumped in the same database
//! transaction as the mutation it describes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Change-tracking database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "change_tracking")]
pub struct Model {
    /// Tracked table name (`events`, `products`, `orders` or `users`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub table_name: String,
    /// Monotonically increasing change counter
    pub version: i64,
    /// When the table last changed
    pub last_changed_at: DateTimeUtc,
}

/// `ChangeTracking` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
