//! Change tracking - per-table version counters.
//!
//! Each tracked table has one row in `change_tracking` holding a version
//! number and the time of the last change. Every mutating workflow calls
//! [`mark_changed`] with its own open transaction, so the bump commits or
//! rolls back together with the data it describes. Clients compare versions
//! instead of re-fetching whole tables.

use crate::{
    entities::{ChangeTracking, change_tracking},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*, sea_query::Expr};
use serde::Serialize;
use std::{fmt, str::FromStr};
use tracing::{debug, info};

/// The tables whose changes are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedTable {
    /// `events`
    Events,
    /// `products`
    Products,
    /// `orders`
    Orders,
    /// `users`
    Users,
}

impl TrackedTable {
    /// All tracked tables, in reporting order.
    pub const ALL: [Self; 4] = [Self::Events, Self::Products, Self::Orders, Self::Users];

    /// The table name as stored in `change_tracking`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for TrackedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackedTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| Error::InvalidTable {
                name: s.to_string(),
            })
    }
}

/// Snapshot of one table's tracking state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableChange {
    /// Change counter, starts at 0
    pub version: i64,
    /// When the counter last moved
    pub last_changed: DateTime<Utc>,
}

impl From<change_tracking::Model> for TableChange {
    fn from(value: change_tracking::Model) -> Self {
        Self {
            version: value.version,
            last_changed: value.last_changed_at,
        }
    }
}

/// Tracking state of all four tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    /// `events` tracking state
    pub events: TableChange,
    /// `products` tracking state
    pub products: TableChange,
    /// `orders` tracking state
    pub orders: TableChange,
    /// `users` tracking state
    pub users: TableChange,
}

impl ChangeSummary {
    /// Returns the entry for `table`.
    #[must_use]
    pub const fn get(&self, table: TrackedTable) -> &TableChange {
        match table {
            TrackedTable::Events => &self.events,
            TrackedTable::Products => &self.products,
            TrackedTable::Orders => &self.orders,
            TrackedTable::Users => &self.users,
        }
    }
}

/// Inserts the tracking row for any table that does not have one yet.
///
/// Called once at startup; existing rows are left untouched.
pub async fn ensure_tracking_rows<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    for table in TrackedTable::ALL {
        if ChangeTracking::find_by_id(table.as_str())
            .one(db)
            .await?
            .is_none()
        {
            change_tracking::ActiveModel {
                table_name: Set(table.as_str().to_string()),
                version: Set(0),
                last_changed_at: Set(Utc::now()),
            }
            .insert(db)
            .await?;
            debug!("Created change-tracking row for {}", table);
        }
    }
    Ok(())
}

/// Records a change to `table`: bumps its version and stamps the current time.
///
/// Pass the transaction that performs the tracked mutation so both commit
/// together.
pub async fn mark_changed<C>(db: &C, table: TrackedTable) -> Result<TableChange>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let result = ChangeTracking::update_many()
        .col_expr(
            change_tracking::Column::Version,
            Expr::col(change_tracking::Column::Version).add(1),
        )
        .col_expr(change_tracking::Column::LastChangedAt, Expr::value(now))
        .filter(change_tracking::Column::TableName.eq(table.as_str()))
        .exec(db)
        .await?;

    // Row was never seeded; create it already bumped
    if result.rows_affected == 0 {
        change_tracking::ActiveModel {
            table_name: Set(table.as_str().to_string()),
            version: Set(1),
            last_changed_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    let entry = read_table(db, table).await?;
    info!("Marked {} changed (version {})", table, entry.version);
    Ok(entry)
}

/// Like [`mark_changed`], for a table given by name.
///
/// # Errors
/// Returns [`Error::InvalidTable`] for anything other than `events`,
/// `products`, `orders` or `users`.
pub async fn mark_changed_by_name<C>(db: &C, table_name: &str) -> Result<TableChange>
where
    C: ConnectionTrait,
{
    let table = table_name.parse::<TrackedTable>()?;
    mark_changed(db, table).await
}

/// Reads the tracking state of a single table.
pub async fn read_table<C>(db: &C, table: TrackedTable) -> Result<TableChange>
where
    C: ConnectionTrait,
{
    ChangeTracking::find_by_id(table.as_str())
        .one(db)
        .await?
        .map(TableChange::from)
        .ok_or_else(|| Error::InvalidTable {
            name: table.as_str().to_string(),
        })
}

/// Reads the tracking state of all four tables.
pub async fn read<C>(db: &C) -> Result<ChangeSummary>
where
    C: ConnectionTrait,
{
    Ok(ChangeSummary {
        events: read_table(db, TrackedTable::Events).await?,
        products: read_table(db, TrackedTable::Products).await?,
        orders: read_table(db, TrackedTable::Orders).await?,
        users: read_table(db, TrackedTable::Users).await?,
    })
}
