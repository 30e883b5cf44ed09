//! User business logic - Accounts, credentials and activity tracking.
//!
//! Accounts are created by administrators (or the startup bootstrap) with a
//! generated password. Login and per-request activity stamps are written
//! directly to the user row and do not count as a tracked change.

use crate::{
    auth::password::{generate_secret, hash_password, verify_password},
    config::settings::SecurityConfig,
    core::{
        json_type_name, new_uuid, parse_uuid,
        tracking::{self, TrackedTable},
    },
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use serde_json::Value;
use std::{fs, path::Path};
use tracing::{debug, info, instrument};

/// Username of the bootstrap administrator
pub const ADMIN_USERNAME: &str = "admin";

/// Country used when none is given
const DEFAULT_COUNTRY: &str = "NL";

/// Fields needed to create an account.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub postal_code: String,
    pub address: String,
    pub country: String,
    pub admin: bool,
}

impl NewUser {
    /// Reads account fields from a request body.
    ///
    /// `username`, `name`, `email`, `phone_number`, `postal_code` and
    /// `address` are required strings; `country` and `admin` are optional.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let Value::Object(fields) = payload else {
            return Err(Error::InvalidType {
                message: format!("Expected object, instead got {}", json_type_name(payload)),
            });
        };

        let required = |field: &str| match fields.get(field) {
            Some(Value::String(value)) => Ok(value.clone()),
            other => Err(Error::InvalidType {
                message: format!(
                    "Expected str for <{field}>, instead got {}",
                    json_type_name(other.unwrap_or(&Value::Null))
                ),
            }),
        };

        let country = match fields.get("country") {
            None | Some(Value::Null) => DEFAULT_COUNTRY.to_string(),
            Some(Value::String(country)) => country.clone(),
            Some(other) => {
                return Err(Error::InvalidType {
                    message: format!(
                        "Expected str for <country>, instead got {}",
                        json_type_name(other)
                    ),
                });
            }
        };

        let admin = match fields.get("admin") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(admin)) => *admin,
            Some(other) => {
                return Err(Error::InvalidType {
                    message: format!(
                        "Expected bool for <admin>, instead got {}",
                        json_type_name(other)
                    ),
                });
            }
        };

        Ok(Self {
            username: required("username")?,
            name: required("name")?,
            email: required("email")?,
            phone_number: required("phone_number")?,
            postal_code: required("postal_code")?,
            address: required("address")?,
            country,
            admin,
        })
    }
}

/// The user fields visible to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    /// Public identifier
    pub uuid: String,
    /// Full name
    pub name: String,
    /// Login name
    pub username: String,
    /// Country code
    pub country: String,
    /// Admin flag
    pub admin: bool,
    /// Set once the user has logged in
    pub active: Option<bool>,
}

impl From<&user::Model> for PublicUser {
    fn from(value: &user::Model) -> Self {
        Self {
            uuid: value.uuid.clone(),
            name: value.name.clone(),
            username: value.username.clone(),
            country: value.country.clone(),
            admin: value.admin,
            active: value.active,
        }
    }
}

/// Creates an account with the given plaintext password. Bumps `users`.
///
/// # Errors
/// Returns [`Error::UniqueViolation`] naming the constraint when the
/// username, email, phone number or postal code is taken.
#[instrument(skip(db, new_user, password), fields(username = %new_user.username))]
pub async fn create_user(
    db: &DatabaseConnection,
    new_user: NewUser,
    password: &str,
) -> Result<user::Model> {
    let password_hash = hash_password(password)?;
    let txn = db.begin().await?;

    let created = user::ActiveModel {
        uuid: Set(new_uuid()),
        username: Set(new_user.username),
        name: Set(new_user.name),
        email: Set(new_user.email),
        phone_number: Set(new_user.phone_number),
        address: Set(new_user.address),
        postal_code: Set(new_user.postal_code),
        country: Set(new_user.country),
        admin: Set(new_user.admin),
        password: Set(password_hash),
        created_at: Set(Utc::now()),
        active: Set(None),
        last_action_at: Set(None),
        last_action: Set(None),
        last_action_ip: Set(None),
        last_login_at: Set(None),
        last_login_ip: Set(None),
        login_count: Set(0),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(Error::from_insert)?;

    tracking::mark_changed(&txn, TrackedTable::Users).await?;
    txn.commit().await?;

    info!("Created user {} ({})", created.username, created.uuid);
    Ok(created)
}

/// Creates an account with a generated password, returning both.
pub async fn create_user_with_generated_password(
    db: &DatabaseConnection,
    new_user: NewUser,
    security: &SecurityConfig,
) -> Result<(user::Model, String)> {
    let password = generate_secret(security.secret_length, &security.character_list);
    let created = create_user(db, new_user, &password).await?;
    Ok((created, password))
}

/// Looks a user up by uuid without validating its format.
pub async fn find_user_by_uuid<C>(db: &C, uuid: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Uuid.eq(uuid))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks a user up by login name.
pub async fn find_user_by_username<C>(db: &C, username: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks a user up by uuid.
///
/// # Errors
/// [`Error::InvalidUuid`] for a malformed uuid, [`Error::UserNotFound`] when
/// nothing matches.
pub async fn get_user_by_uuid(db: &DatabaseConnection, uuid: &str) -> Result<user::Model> {
    parse_uuid(uuid)?;
    find_user_by_uuid(db, uuid)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            context: format!("User <{uuid}> not found"),
        })
}

/// Lists every user, oldest first.
pub async fn get_all_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes the user with `uuid`, returning the uuid. Bumps `users`.
///
/// The user's orders are kept.
///
/// # Errors
/// [`Error::InvalidUuid`] or [`Error::UserNotFound`].
pub async fn delete_user(db: &DatabaseConnection, uuid: &str) -> Result<String> {
    parse_uuid(uuid)?;
    let txn = db.begin().await?;

    let result = User::delete_many()
        .filter(user::Column::Uuid.eq(uuid))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::UserNotFound {
            context: format!("User <{uuid}> not found"),
        });
    }

    tracking::mark_changed(&txn, TrackedTable::Users).await?;
    txn.commit().await?;

    info!("Deleted user {}", uuid);
    Ok(uuid.to_string())
}

/// Checks a username/password pair.
///
/// # Errors
/// [`Error::InvalidCredentials`] for an unknown user or a wrong password.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let account = find_user_by_username(db, username)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !verify_password(password, &account.password)? {
        debug!("Wrong password for {}", username);
        return Err(Error::InvalidCredentials);
    }
    Ok(account)
}

/// Stamps the last action of `account`.
pub async fn record_action(
    db: &DatabaseConnection,
    account: &user::Model,
    action: &str,
    ip: Option<String>,
) -> Result<()> {
    User::update_many()
        .col_expr(user::Column::LastActionAt, Expr::value(Utc::now()))
        .col_expr(user::Column::LastAction, Expr::value(action))
        .col_expr(user::Column::LastActionIp, Expr::value(ip))
        .filter(user::Column::Id.eq(account.id))
        .exec(db)
        .await?;
    Ok(())
}

/// Records a successful login: marks the account active, stamps time and IP,
/// and increments the login count.
pub async fn record_login(
    db: &DatabaseConnection,
    account: user::Model,
    ip: Option<String>,
) -> Result<user::Model> {
    let login_count = account.login_count.saturating_add(1);
    let mut active: user::ActiveModel = account.into();
    active.active = Set(Some(true));
    active.last_login_at = Set(Some(Utc::now()));
    active.last_login_ip = Set(ip);
    active.login_count = Set(login_count);
    active.update(db).await.map_err(Into::into)
}

/// Creates the bootstrap administrator unless an account named
/// [`ADMIN_USERNAME`] exists.
///
/// The generated password is written to `security.admin_credentials_path`.
/// Returns the new account, or `None` when it already existed.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    security: &SecurityConfig,
) -> Result<Option<user::Model>> {
    if find_user_by_username(db, ADMIN_USERNAME).await?.is_some() {
        debug!("Administrator account already present");
        return Ok(None);
    }

    let admin = NewUser {
        username: ADMIN_USERNAME.to_string(),
        name: "Example Administrator".to_string(),
        email: "admin@administrator.com".to_string(),
        phone_number: "0612345678".to_string(),
        postal_code: "1234AB".to_string(),
        address: "Example".to_string(),
        country: DEFAULT_COUNTRY.to_string(),
        admin: true,
    };
    let (created, password) = create_user_with_generated_password(db, admin, security).await?;
    write_credentials(&security.admin_credentials_path, &created, &password)?;

    info!(
        "Created administrator {}, credentials written to {}",
        created.username,
        security.admin_credentials_path.display()
    );
    Ok(Some(created))
}

fn write_credentials(path: &Path, account: &user::Model, password: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(
        path,
        format!(
            "username: {}\npassword: {}\nuuid: {}\n",
            account.username, password, account.uuid
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_user_hashes_password_and_bumps_users() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_user(&db, test_new_user("alice"), "s3cret").await?;

        assert_eq!(created.username, "alice");
        assert_eq!(created.country, "NL");
        assert!(!created.admin);
        assert_ne!(created.password, "s3cret");
        assert_eq!(created.login_count, 0);
        assert_eq!(created.active, None);
        assert_eq!(tracking::read(&db).await?.users.version, 1);

        let authed = authenticate(&db, "alice", "s3cret").await?;
        assert_eq!(authed.uuid, created.uuid);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_user_reports_constraint() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, test_new_user("alice"), "pw").await?;

        let mut same_email = test_new_user("alicia");
        same_email.email = "alice@example.com".to_string();
        let result = create_user(&db, same_email, "pw").await;

        assert!(matches!(
            result,
            Err(Error::UniqueViolation { constraint, .. }) if constraint == "users.email"
        ));
        assert_eq!(get_all_users(&db).await?.len(), 1);
        assert_eq!(tracking::read(&db).await?.users.version, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_generated_password_follows_security_config() -> Result<()> {
        let db = setup_test_db().await?;
        let security = SecurityConfig {
            secret_length: 12,
            character_list: "xyz".to_string(),
            ..Default::default()
        };

        let (created, password) =
            create_user_with_generated_password(&db, test_new_user("alice"), &security).await?;
        assert_eq!(password.len(), 12);
        assert!(password.chars().all(|c| "xyz".contains(c)));
        assert_eq!(authenticate(&db, "alice", &password).await?.id, created.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_failures() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, test_new_user("alice"), "right").await?;

        assert!(matches!(
            authenticate(&db, "alice", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&db, "nobody", "right").await,
            Err(Error::InvalidCredentials)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_activity_stamps_do_not_bump_users() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_user(&db, test_new_user("alice"), "pw").await?;
        let before = tracking::read(&db).await?;

        record_action(&db, &created, "/order/current", Some("10.0.0.1".to_string())).await?;
        let logged_in = record_login(&db, created.clone(), None).await?;
        let logged_in = record_login(&db, logged_in, Some("10.0.0.2".to_string())).await?;

        assert_eq!(logged_in.login_count, 2);
        assert_eq!(logged_in.active, Some(true));
        assert_eq!(logged_in.last_login_ip.as_deref(), Some("10.0.0.2"));
        assert!(logged_in.last_login_at.is_some());

        let stored = get_user_by_uuid(&db, &created.uuid).await?;
        assert_eq!(stored.last_action.as_deref(), Some("/order/current"));
        assert_eq!(stored.last_action_ip.as_deref(), Some("10.0.0.1"));
        assert!(stored.last_action_at.is_some());

        assert_eq!(tracking::read(&db).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_user(&db, test_new_user("alice"), "pw").await?;

        assert_eq!(delete_user(&db, &created.uuid).await?, created.uuid);
        assert!(find_user_by_uuid(&db, &created.uuid).await?.is_none());
        assert_eq!(tracking::read(&db).await?.users.version, 2);

        assert!(matches!(
            delete_user(&db, &created.uuid).await,
            Err(Error::UserNotFound { context: _ })
        ));
        assert!(matches!(
            delete_user(&db, "alice").await,
            Err(Error::InvalidUuid { value: _ })
        ));
        assert!(matches!(
            get_user_by_uuid(&db, &created.uuid).await,
            Err(Error::UserNotFound { context: _ })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_admin_writes_credentials_once() -> Result<()> {
        let db = setup_test_db().await?;
        let path = std::env::temp_dir().join(format!("order-server-{}.txt", new_uuid()));
        let security = SecurityConfig {
            admin_credentials_path: path.clone(),
            ..Default::default()
        };

        let created = ensure_admin(&db, &security).await?.unwrap();
        assert!(created.admin);
        assert_eq!(created.username, ADMIN_USERNAME);

        let contents = fs::read_to_string(&path)?;
        let password = contents
            .lines()
            .find_map(|line| line.strip_prefix("password: "))
            .unwrap();
        assert_eq!(password.len(), security.secret_length);
        assert!(authenticate(&db, ADMIN_USERNAME, password).await?.admin);

        assert!(ensure_admin(&db, &security).await?.is_none());
        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn test_new_user_from_json() {
        let parsed = NewUser::from_json(&json!({
            "username": "alice",
            "name": "Alice",
            "email": "alice@example.com",
            "phone_number": "0611111111",
            "postal_code": "1111AA",
            "address": "Main Street 1",
        }))
        .unwrap();
        assert_eq!(parsed.country, "NL");
        assert!(!parsed.admin);

        let err = NewUser::from_json(&json!({"username": "alice", "name": 5})).unwrap_err();
        assert_eq!(err.to_string(), "Expected str for <name>, instead got number");

        let err = NewUser::from_json(&json!({"username": "alice"})).unwrap_err();
        assert_eq!(err.to_string(), "Expected str for <name>, instead got null");
    }

    #[test]
    fn test_public_user_hides_private_fields() {
        let model = test_user_model("alice", false);
        let public = serde_json::to_value(PublicUser::from(&model)).unwrap();
        let keys: Vec<&str> = public
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            ["active", "admin", "country", "name", "username", "uuid"]
        );
    }
}
