//! Catalog populate - Replaces the product table from a JSON feed.
//!
//! The feed is a file of the form `{"products": [...]}` and is trusted: entries
//! are mapped onto rows field for field. Every populate assigns fresh product
//! uuids, so orders placed before a populate keep uuids that no longer resolve.

use crate::{
    core::{
        new_uuid,
        tracking::{self, TrackedTable},
    },
    entities::{Product, StringList, product},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Instant};
use tracing::{debug, info, instrument};

/// Rows per insert statement, kept well below `SQLite`'s bound-parameter limit
const INSERT_CHUNK_SIZE: usize = 100;

/// Top-level shape of the feed file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFeed {
    /// Feed entries, in insertion order
    pub products: Vec<CatalogEntry>,
}

/// One product as it appears in the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_path: String,
    #[serde(default)]
    pub original_link: String,
    #[serde(default)]
    pub nutri_score: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub saturated_fat: Option<f64>,
    #[serde(default)]
    pub unsaturated_fat: Option<f64>,
    #[serde(default)]
    pub carbohydrates: Option<f64>,
    #[serde(default)]
    pub sugars: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub proteins: Option<f64>,
    #[serde(default)]
    pub salt: Option<f64>,
    #[serde(default)]
    pub extra: Option<Json>,
}

impl CatalogEntry {
    fn into_active_model(self) -> product::ActiveModel {
        product::ActiveModel {
            id: Set(self.id),
            uuid: Set(new_uuid()),
            name: Set(self.name),
            brand: Set(self.brand),
            price: Set(self.price),
            category: Set(self.category),
            description: Set(self.description),
            image: Set(self.image),
            image_path: Set(self.image_path),
            original_link: Set(self.original_link),
            nutri_score: Set(self.nutri_score.map(|score| score.to_uppercase())),
            quantity: Set(self.quantity),
            allergens: Set(StringList(self.allergens)),
            ingredients: Set(StringList(self.ingredients)),
            energy: Set(self.energy),
            fat: Set(self.fat),
            saturated_fat: Set(self.saturated_fat),
            unsaturated_fat: Set(self.unsaturated_fat),
            carbohydrates: Set(self.carbohydrates),
            sugars: Set(self.sugars),
            fiber: Set(self.fiber),
            proteins: Set(self.proteins),
            salt: Set(self.salt),
            extra: Set(self.extra),
        }
    }
}

/// Outcome of a populate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulateSummary {
    /// Number of products inserted
    pub count: usize,
    /// Wall time of the run in milliseconds
    pub elapsed_ms: u64,
}

/// Parses a feed document.
///
/// # Errors
/// Returns [`Error::Json`] when the document is not a valid feed.
pub fn parse_feed(contents: &str) -> Result<Vec<CatalogEntry>> {
    let feed: CatalogFeed = serde_json::from_str(contents)?;
    Ok(feed.products)
}

/// Reads and parses the feed file at `path`.
///
/// # Errors
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Json`]
/// when it is not a valid feed.
pub fn load_feed<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogEntry>> {
    let path = path.as_ref();
    debug!("Loading catalog feed from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    parse_feed(&contents)
}

/// Deletes every product and inserts `entries` in their place. Bumps
/// `products`.
///
/// Runs in a single transaction: a failing insert leaves the previous catalog
/// in place. An empty feed empties the catalog and still counts as a change.
#[instrument(skip_all, fields(entries = entries.len()))]
pub async fn populate(
    db: &DatabaseConnection,
    entries: Vec<CatalogEntry>,
) -> Result<PopulateSummary> {
    let start = Instant::now();
    let count = entries.len();
    let txn = db.begin().await?;

    let removed = Product::delete_many().exec(&txn).await?;
    debug!("Removed {} products", removed.rows_affected);

    let mut rows = entries.into_iter().map(CatalogEntry::into_active_model);
    loop {
        let chunk: Vec<product::ActiveModel> = rows.by_ref().take(INSERT_CHUNK_SIZE).collect();
        if chunk.is_empty() {
            break;
        }
        Product::insert_many(chunk)
            .exec(&txn)
            .await
            .map_err(Error::from_insert)?;
    }

    tracking::mark_changed(&txn, TrackedTable::Products).await?;
    txn.commit().await?;

    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!("Populated {} products in {}ms", count, elapsed_ms);
    Ok(PopulateSummary { count, elapsed_ms })
}
