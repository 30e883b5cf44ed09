//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod change_tracking;
pub mod event;
pub mod order;
pub mod product;
pub mod user;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

// Re-export specific types to avoid conflicts
pub use change_tracking::{Entity as ChangeTracking, Model as ChangeTrackingModel};
pub use event::{Entity as Event, Model as EventModel};
pub use order::{Entity as Order, Model as OrderModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use user::{Entity as User, Model as UserModel};

/// A list of strings stored as a single JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// Borrows the entries.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
