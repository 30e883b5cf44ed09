//! Event business logic - Lookups, creation and activation of ordering windows.
//!
//! Orders are always placed against the active event. Whether creating or
//! activating an event deactivates every other one is governed by
//! [`EventPolicyConfig::exclusive_activation`]; when several events are active
//! anyway, the oldest one is treated as current.

use crate::{
    config::settings::EventPolicyConfig,
    core::{
        json_type_name, new_uuid, parse_uuid,
        tracking::{self, TrackedTable},
    },
    entities::{Event, event},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde_json::Value;
use tracing::{debug, info};

/// Finds the current event, if any.
pub async fn find_active_event<C>(db: &C) -> Result<Option<event::Model>>
where
    C: ConnectionTrait,
{
    Event::find()
        .filter(event::Column::Active.eq(true))
        .order_by_asc(event::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the current event.
///
/// # Errors
/// Returns [`Error::NoActiveEvent`] when no event is active. This is a
/// server-state problem, reported differently from a missing lookup.
pub async fn get_active_event<C>(db: &C) -> Result<event::Model>
where
    C: ConnectionTrait,
{
    find_active_event(db).await?.ok_or(Error::NoActiveEvent)
}

/// Looks an event up by its public uuid.
///
/// # Errors
/// Returns [`Error::InvalidUuid`] for a malformed uuid and
/// [`Error::EventNotFound`] when nothing matches.
pub async fn get_event_by_uuid<C>(db: &C, uuid: &str) -> Result<event::Model>
where
    C: ConnectionTrait,
{
    parse_uuid(uuid)?;
    Event::find()
        .filter(event::Column::Uuid.eq(uuid))
        .one(db)
        .await?
        .ok_or_else(|| Error::EventNotFound {
            context: format!("Event <{uuid}> not found"),
        })
}

/// Lists every event, oldest first.
pub async fn get_all_events(db: &DatabaseConnection) -> Result<Vec<event::Model>> {
    Event::find()
        .order_by_asc(event::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Parameters for a new event. Missing values fall back to the event policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEvent {
    /// Order ceiling
    pub max_order_price: Option<f64>,
    /// End of the ordering window
    pub until: Option<DateTime<Utc>>,
    /// Order cutoff
    pub deadline: Option<DateTime<Utc>>,
    /// Whether the event becomes the current one
    pub active: bool,
}

impl NewEvent {
    /// Reads event parameters from a request body.
    ///
    /// Every field is optional; `active` defaults to `true`. Timestamps are
    /// RFC 3339 strings.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let Value::Object(fields) = payload else {
            return Err(Error::InvalidType {
                message: format!("Expected object, instead got {}", json_type_name(payload)),
            });
        };

        let max_order_price = match fields.get("max_order_price") {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => number.as_f64(),
            Some(other) => {
                return Err(Error::InvalidType {
                    message: format!(
                        "Expected number for <max_order_price>, instead got {}",
                        json_type_name(other)
                    ),
                });
            }
        };

        let active = match fields.get("active") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(active)) => *active,
            Some(other) => {
                return Err(Error::InvalidType {
                    message: format!(
                        "Expected bool for <active>, instead got {}",
                        json_type_name(other)
                    ),
                });
            }
        };

        Ok(Self {
            max_order_price,
            until: optional_timestamp(fields.get("until"), "until")?,
            deadline: optional_timestamp(fields.get("deadline"), "deadline")?,
            active,
        })
    }
}

fn optional_timestamp(value: Option<&Value>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|e| Error::InvalidType {
                message: format!("Field <{field}> is not an RFC 3339 timestamp: {e}"),
            }),
        Some(other) => Err(Error::InvalidType {
            message: format!(
                "Expected string for <{field}>, instead got {}",
                json_type_name(other)
            ),
        }),
    }
}

fn days(count: i64) -> Result<Duration> {
    Duration::try_days(count).ok_or_else(|| Error::Config {
        message: format!("Event duration of {count} days is out of range"),
    })
}

/// Sets `active = false` on every active event except `keep`.
async fn deactivate_others<C>(db: &C, keep: Option<i64>) -> Result<u64>
where
    C: ConnectionTrait,
{
    let mut query = Event::update_many()
        .col_expr(event::Column::Active, Expr::value(false))
        .filter(event::Column::Active.eq(true));
    if let Some(id) = keep {
        query = query.filter(event::Column::Id.ne(id));
    }
    let result = query.exec(db).await?;
    Ok(result.rows_affected)
}

/// Creates an event, filling gaps from `policy`.
///
/// When the event is active and exclusive activation is on, every other event
/// is deactivated in the same transaction. Bumps `events`.
///
/// # Errors
/// Returns [`Error::InvalidType`] for a negative or non-finite ceiling, or a
/// deadline after the end of the event.
pub async fn create_event(
    db: &DatabaseConnection,
    new_event: NewEvent,
    policy: &EventPolicyConfig,
) -> Result<event::Model> {
    let now = Utc::now();
    let max_order_price = new_event
        .max_order_price
        .unwrap_or(policy.default_max_order_price);
    if !max_order_price.is_finite() || max_order_price < 0.0 {
        return Err(Error::InvalidType {
            message: format!("Invalid maximum order price: <{max_order_price}>"),
        });
    }

    let until = match new_event.until {
        Some(until) => until,
        None => now + days(policy.default_duration_days)?,
    };
    let deadline = match new_event.deadline {
        Some(deadline) => deadline,
        None => (now + days(policy.default_deadline_days)?).min(until),
    };
    if deadline > until {
        return Err(Error::InvalidType {
            message: "Field <deadline> must not be after <until>".to_string(),
        });
    }

    let txn = db.begin().await?;
    if new_event.active && policy.exclusive_activation {
        let deactivated = deactivate_others(&txn, None).await?;
        debug!("Deactivated {} events", deactivated);
    }

    let created = event::ActiveModel {
        uuid: Set(new_uuid()),
        active: Set(new_event.active),
        created_at: Set(now),
        until: Set(until),
        deadline: Set(deadline),
        max_order_price: Set(max_order_price),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    tracking::mark_changed(&txn, TrackedTable::Events).await?;
    txn.commit().await?;

    info!(
        "Created event {} (active: {}, max order price: {})",
        created.uuid, created.active, created.max_order_price
    );
    Ok(created)
}

/// Makes the event with `uuid` active. Bumps `events`.
///
/// # Errors
/// Returns [`Error::InvalidUuid`] or [`Error::EventNotFound`].
pub async fn activate_event(
    db: &DatabaseConnection,
    uuid: &str,
    policy: &EventPolicyConfig,
) -> Result<event::Model> {
    parse_uuid(uuid)?;
    let txn = db.begin().await?;

    let existing = get_event_by_uuid(&txn, uuid).await?;
    if policy.exclusive_activation {
        deactivate_others(&txn, Some(existing.id)).await?;
    }

    let mut active: event::ActiveModel = existing.into();
    active.active = Set(true);
    let updated = active.update(&txn).await?;

    tracking::mark_changed(&txn, TrackedTable::Events).await?;
    txn.commit().await?;

    info!("Activated event {}", updated.uuid);
    Ok(updated)
}

/// Seeds an active event with the policy defaults when none is active.
///
/// Returns the seeded event, or `None` when seeding is disabled or an active
/// event already exists.
pub async fn ensure_default_event(
    db: &DatabaseConnection,
    policy: &EventPolicyConfig,
) -> Result<Option<event::Model>> {
    if !policy.seed_default {
        debug!("Default event seeding disabled");
        return Ok(None);
    }
    if find_active_event(db).await?.is_some() {
        return Ok(None);
    }

    let seeded = create_event(
        db,
        NewEvent {
            active: true,
            ..Default::default()
        },
        policy,
    )
    .await?;
    Ok(Some(seeded))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use serde_json::json;

    #[tokio::test]
    async fn test_no_active_event() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(find_active_event(&db).await?.is_none());
        assert!(matches!(
            get_active_event(&db).await,
            Err(Error::NoActiveEvent)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_event_uses_policy_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = EventPolicyConfig::default();
        let before = Utc::now();

        let created = create_event(
            &db,
            NewEvent {
                active: true,
                ..Default::default()
            },
            &policy,
        )
        .await?;

        assert!(created.active);
        assert_eq!(created.max_order_price, 20.0);
        assert!(created.until >= before + Duration::days(7));
        assert!(created.deadline >= before + Duration::days(4));
        assert!(created.deadline < created.until);
        assert_eq!(get_active_event(&db).await?.uuid, created.uuid);
        assert_eq!(tracking::read(&db).await?.events.version, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_exclusive_activation() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = EventPolicyConfig::default();
        let new_active = NewEvent {
            active: true,
            ..Default::default()
        };

        let first = create_event(&db, new_active.clone(), &policy).await?;
        let second = create_event(&db, new_active, &policy).await?;

        let first = get_event_by_uuid(&db, &first.uuid).await?;
        assert!(!first.active);
        assert_eq!(get_active_event(&db).await?.uuid, second.uuid);

        activate_event(&db, &first.uuid, &policy).await?;
        let second = get_event_by_uuid(&db, &second.uuid).await?;
        assert!(!second.active);
        assert_eq!(get_active_event(&db).await?.uuid, first.uuid);
        assert_eq!(tracking::read(&db).await?.events.version, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_exclusive_activation_keeps_oldest_current() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = EventPolicyConfig {
            exclusive_activation: false,
            ..Default::default()
        };
        let new_active = NewEvent {
            active: true,
            ..Default::default()
        };

        let first = create_event(&db, new_active.clone(), &policy).await?;
        let second = create_event(&db, new_active, &policy).await?;

        assert!(get_event_by_uuid(&db, &second.uuid).await?.active);
        assert_eq!(get_active_event(&db).await?.uuid, first.uuid);
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_event_leaves_current_alone() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = EventPolicyConfig::default();
        let current = create_event(
            &db,
            NewEvent {
                active: true,
                ..Default::default()
            },
            &policy,
        )
        .await?;

        create_event(&db, NewEvent::default(), &policy).await?;

        assert_eq!(get_active_event(&db).await?.uuid, current.uuid);
        assert_eq!(get_all_events(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_event_rejects_bad_values() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = EventPolicyConfig::default();

        let negative = NewEvent {
            max_order_price: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            create_event(&db, negative, &policy).await,
            Err(Error::InvalidType { message: _ })
        ));

        let now = Utc::now();
        let backwards = NewEvent {
            until: Some(now + Duration::days(1)),
            deadline: Some(now + Duration::days(2)),
            ..Default::default()
        };
        assert!(matches!(
            create_event(&db, backwards, &policy).await,
            Err(Error::InvalidType { message: _ })
        ));

        assert!(get_all_events(&db).await?.is_empty());
        assert_eq!(tracking::read(&db).await?.events.version, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_short_event_clamps_default_deadline() -> Result<()> {
        let db = setup_test_db().await?;
        let until = Utc::now() + Duration::days(1);
        let created = create_event(
            &db,
            NewEvent {
                until: Some(until),
                ..Default::default()
            },
            &EventPolicyConfig::default(),
        )
        .await?;
        assert_eq!(created.deadline, created.until);
        Ok(())
    }

    #[tokio::test]
    async fn test_activate_event_lookup_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = EventPolicyConfig::default();

        assert!(matches!(
            activate_event(&db, "not-a-uuid", &policy).await,
            Err(Error::InvalidUuid { value: _ })
        ));
        assert!(matches!(
            activate_event(&db, &new_uuid(), &policy).await,
            Err(Error::EventNotFound { context: _ })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_default_event() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = EventPolicyConfig::default();

        let seeded = ensure_default_event(&db, &policy).await?;
        assert!(seeded.is_some());
        assert!(ensure_default_event(&db, &policy).await?.is_none());
        assert_eq!(get_all_events(&db).await?.len(), 1);

        let disabled = EventPolicyConfig {
            seed_default: false,
            ..Default::default()
        };
        let empty = setup_test_db().await?;
        assert!(ensure_default_event(&empty, &disabled).await?.is_none());
        assert!(get_all_events(&empty).await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_new_event_from_json() {
        let parsed = NewEvent::from_json(&json!({
            "max_order_price": 35,
            "until": "2030-01-08T12:00:00Z",
            "deadline": "2030-01-05T12:00:00+01:00",
        }))
        .unwrap();
        assert_eq!(parsed.max_order_price, Some(35.0));
        assert!(parsed.active);
        assert_eq!(
            parsed.deadline.unwrap().to_rfc3339(),
            "2030-01-05T11:00:00+00:00"
        );

        let defaults = NewEvent::from_json(&json!({"active": false})).unwrap();
        assert_eq!(defaults.max_order_price, None);
        assert!(!defaults.active);

        for bad in [
            json!([]),
            json!({"max_order_price": "20"}),
            json!({"until": "next week"}),
            json!({"active": "yes"}),
        ] {
            assert!(matches!(
                NewEvent::from_json(&bad),
                Err(Error::InvalidType { message: _ })
            ));
        }
    }
}
