//! Product entity - Represents one entry of the product catalog.
//!
//! Products are never edited in place: the admin populate operation replaces
//! the whole table from the catalog feed. Orders reference products by `uuid`.

use super::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Identifier carried over from the catalog feed
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Public identifier used by orders
    #[sea_orm(unique)]
    pub uuid: String,
    /// Display name, unique across the catalog
    #[sea_orm(unique)]
    pub name: String,
    /// Brand or manufacturer
    pub brand: String,
    /// Unit price
    pub price: f64,
    /// Catalog category
    pub category: String,
    /// Free-text description
    pub description: String,
    /// Remote image reference
    pub image: Option<String>,
    /// Locally stored image path
    pub image_path: String,
    /// Link to the product at the supplier
    pub original_link: String,

    /// Nutri-Score letter, always uppercase
    pub nutri_score: Option<String>,
    /// Package quantity as printed (e.g. "500 g")
    pub quantity: Option<String>,
    /// Declared allergens
    #[sea_orm(column_type = "Json")]
    pub allergens: StringList,
    /// Ingredient list
    #[sea_orm(column_type = "Json")]
    pub ingredients: StringList,

    /// Energy per 100g (kcal)
    pub energy: Option<f64>,
    /// Fat per 100g
    pub fat: Option<f64>,
    /// Saturated fat per 100g
    pub saturated_fat: Option<f64>,
    /// Unsaturated fat per 100g
    pub unsaturated_fat: Option<f64>,
    /// Carbohydrates per 100g
    pub carbohydrates: Option<f64>,
    /// Sugars per 100g
    pub sugars: Option<f64>,
    /// Fiber per 100g
    pub fiber: Option<f64>,
    /// Proteins per 100g
    pub proteins: Option<f64>,
    /// Salt per 100g
    pub salt: Option<f64>,
    /// Anything else the feed carries for this product
    #[sea_orm(column_type = "Json", nullable)]
    pub extra: Option<Json>,
}

/// Products are referenced by uuid from a denormalized list on orders, so no
/// relation is declared here.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
