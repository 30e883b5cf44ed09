//! User entity - Accounts that can log in and place orders.
//!
//! Username, email, phone number and postal code are unique. Activity columns
//! are stamped by the authorization middleware on every authenticated request.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Internal identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Public identifier, used as the token subject
    #[sea_orm(unique)]
    pub uuid: String,
    /// Login name
    #[sea_orm(unique)]
    pub username: String,
    /// Full name
    pub name: String,
    /// Contact email
    #[sea_orm(unique)]
    pub email: String,
    /// Contact phone number
    #[sea_orm(unique)]
    pub phone_number: String,
    /// Street address
    pub address: String,
    /// Postal code
    #[sea_orm(unique)]
    pub postal_code: String,
    /// Country code, defaults to "NL"
    pub country: String,
    /// Whether this user may call admin routes
    pub admin: bool,
    /// Argon2 PHC hash of the password
    #[serde(skip_serializing)]
    pub password: String,
    /// When the account was created
    pub created_at: DateTimeUtc,

    /// Set once the user has logged in at least once
    pub active: Option<bool>,
    /// Time of the last authenticated request
    pub last_action_at: Option<DateTimeUtc>,
    /// Route of the last authenticated request
    pub last_action: Option<String>,
    /// Caller IP of the last authenticated request
    pub last_action_ip: Option<String>,
    /// Time of the last successful login
    pub last_login_at: Option<DateTimeUtc>,
    /// Caller IP of the last successful login
    pub last_login_ip: Option<String>,
    /// Number of successful logins
    pub login_count: i32,
}

/// `User` has no declared relationships; orders reference users by uuid
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
