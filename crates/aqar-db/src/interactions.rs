//! Database operations for the append-only `interaction_events` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aqar_core::{Identity, InteractionKind, InteractionSample, ListingSnapshot, PropertyType};

use crate::DbError;

/// A row from the `interaction_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InteractionRow {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub listing_id: i64,
    pub kind: String,
    pub duration_secs: Option<i32>,
    pub city: String,
    pub district: String,
    pub price: i64,
    pub property_type: String,
    pub rooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub occurred_at: DateTime<Utc>,
}

impl InteractionRow {
    /// Convert into the typed sample the learner consumes.
    ///
    /// Unknown kinds are rejected (the CHECK constraint makes them
    /// unreachable through this crate); an unknown snapshot property type
    /// degrades to an absent attribute rather than failing the pass.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] for an unrecognized `kind`.
    pub fn sample(&self) -> Result<InteractionSample, DbError> {
        let kind: InteractionKind = self.kind.parse().map_err(|_| DbError::InvalidColumn {
            column: "interaction_events.kind".to_string(),
            value: self.kind.clone(),
        })?;

        let district = if self.district.trim().is_empty() {
            None
        } else {
            Some(self.district.clone())
        };

        Ok(InteractionSample {
            kind,
            duration_secs: self.duration_secs,
            district,
            price: Some(self.price),
            area_sqm: self.area_sqm,
            property_type: self.property_type.parse::<PropertyType>().ok(),
            occurred_at: self.occurred_at,
        })
    }
}

/// Append an interaction event with the listing snapshot denormalized in.
///
/// Returns the generated event id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_interaction(
    pool: &PgPool,
    identity: &Identity,
    listing_id: i64,
    kind: InteractionKind,
    duration_secs: Option<i32>,
    snapshot: &ListingSnapshot,
) -> Result<i64, DbError> {
    let (user_id, session_id) = identity_columns(identity);

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO interaction_events \
             (user_id, session_id, listing_id, kind, duration_secs, \
              city, district, price, property_type, rooms, area_sqm) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING id",
    )
    .bind(user_id)
    .bind(session_id)
    .bind(listing_id)
    .bind(kind.as_str())
    .bind(duration_secs)
    .bind(&snapshot.city)
    .bind(&snapshot.district)
    .bind(snapshot.price)
    .bind(snapshot.property_type.as_str())
    .bind(snapshot.rooms)
    .bind(snapshot.area_sqm)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List an identity's interactions since `since`, newest first, capped at
/// `limit` rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_interactions(
    pool: &PgPool,
    identity: &Identity,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<InteractionRow>, DbError> {
    const COLUMNS: &str = "id, user_id, session_id, listing_id, kind, duration_secs, \
                           city, district, price, property_type, rooms, area_sqm, occurred_at";

    let rows = match identity {
        Identity::User(user_id) => {
            sqlx::query_as::<_, InteractionRow>(&format!(
                "SELECT {COLUMNS} FROM interaction_events \
                 WHERE user_id = $1 AND occurred_at >= $2 \
                 ORDER BY occurred_at DESC, id DESC \
                 LIMIT $3"
            ))
            .bind(user_id)
            .bind(since)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        Identity::Session(session_id) => {
            sqlx::query_as::<_, InteractionRow>(&format!(
                "SELECT {COLUMNS} FROM interaction_events \
                 WHERE session_id = $1 AND occurred_at >= $2 \
                 ORDER BY occurred_at DESC, id DESC \
                 LIMIT $3"
            ))
            .bind(session_id)
            .bind(since)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

pub(crate) fn identity_columns(identity: &Identity) -> (Option<Uuid>, Option<&str>) {
    match identity {
        Identity::User(id) => (Some(*id), None),
        Identity::Session(id) => (None, Some(id.as_str())),
    }
}
