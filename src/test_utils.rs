//! Shared test utilities for the order server.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::settings::EventPolicyConfig,
    core::{
        event::{self, NewEvent},
        tracking,
        user::{self, NewUser},
    },
    entities,
    errors::Result,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Password every test user is created with
pub const TEST_PASSWORD: &str = "password";

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables and tracking rows
/// initialized. This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = crate::config::database::create_connection("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    tracking::ensure_tracking_rows(&db).await?;
    Ok(db)
}

/// Account fields derived from `username`, unique per username.
pub fn test_new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        name: format!("Test {username}"),
        email: format!("{username}@example.com"),
        phone_number: format!("phone-{username}"),
        postal_code: format!("postal-{username}"),
        address: format!("{username} street 1"),
        country: "NL".to_string(),
        admin: false,
    }
}

/// Creates a regular user with [`TEST_PASSWORD`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    user::create_user(db, test_new_user(username), TEST_PASSWORD).await
}

/// Creates an administrator with [`TEST_PASSWORD`].
pub async fn create_test_admin(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    let new_user = NewUser {
        admin: true,
        ..test_new_user(username)
    };
    user::create_user(db, new_user, TEST_PASSWORD).await
}

/// An unsaved user model, for code that never touches the database.
pub fn test_user_model(username: &str, admin: bool) -> entities::user::Model {
    entities::user::Model {
        id: 1,
        uuid: Uuid::new_v4().to_string(),
        username: username.to_string(),
        name: format!("Test {username}"),
        email: format!("{username}@example.com"),
        phone_number: format!("phone-{username}"),
        address: format!("{username} street 1"),
        postal_code: format!("postal-{username}"),
        country: "NL".to_string(),
        admin,
        password: String::new(),
        created_at: Utc::now(),
        active: None,
        last_action_at: None,
        last_action: None,
        last_action_ip: None,
        last_login_at: None,
        last_login_ip: None,
        login_count: 0,
    }
}

/// Inserts a product with catalog id `id`, bypassing populate.
///
/// # Defaults
/// * `brand`: "Test Brand"
/// * `category`: "test"
/// * no nutrition data
pub async fn create_test_product(
    db: &DatabaseConnection,
    id: i64,
    name: &str,
    price: f64,
) -> Result<entities::product::Model> {
    let product = entities::product::ActiveModel {
        id: Set(id),
        uuid: Set(Uuid::new_v4().to_string()),
        name: Set(name.to_string()),
        brand: Set("Test Brand".to_string()),
        price: Set(price),
        category: Set("test".to_string()),
        description: Set(String::new()),
        image: Set(None),
        image_path: Set(String::new()),
        original_link: Set(String::new()),
        nutri_score: Set(None),
        quantity: Set(None),
        allergens: Set(entities::StringList::default()),
        ingredients: Set(entities::StringList::default()),
        energy: Set(None),
        fat: Set(None),
        saturated_fat: Set(None),
        unsaturated_fat: Set(None),
        carbohydrates: Set(None),
        sugars: Set(None),
        fiber: Set(None),
        proteins: Set(None),
        salt: Set(None),
        extra: Set(None),
    };
    Ok(product.insert(db).await?)
}

/// Creates an active event with the given order ceiling.
pub async fn create_test_event(
    db: &DatabaseConnection,
    max_order_price: f64,
) -> Result<entities::event::Model> {
    event::create_event(
        db,
        NewEvent {
            max_order_price: Some(max_order_price),
            active: true,
            ..Default::default()
        },
        &EventPolicyConfig::default(),
    )
    .await
}

/// Sets up a test database with one active event.
/// Returns both the database connection and the event.
pub async fn setup_with_event(
    max_order_price: f64,
) -> Result<(DatabaseConnection, entities::event::Model)> {
    let db = setup_test_db().await?;
    let event = create_test_event(&db, max_order_price).await?;
    Ok((db, event))
}
