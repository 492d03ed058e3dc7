//! Database operations for the `match_records` table.
//!
//! A `(preference_id, listing_id)` pair is scored at most once; inserts go
//! through `ON CONFLICT DO NOTHING` so repeated scoring passes are
//! idempotent.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `match_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRecordRow {
    pub id: i64,
    pub preference_id: i64,
    pub listing_id: i64,
    pub score: i32,
    pub is_saved: bool,
    pub is_contacted: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert a match record unless the pair already exists.
///
/// Returns `Some(id)` when a new row was created, `None` when the pair was
/// already recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_match_if_absent(
    pool: &PgPool,
    preference_id: i64,
    listing_id: i64,
    score: i32,
) -> Result<Option<i64>, DbError> {
    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO match_records (preference_id, listing_id, score) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (preference_id, listing_id) DO NOTHING \
         RETURNING id",
    )
    .bind(preference_id)
    .bind(listing_id)
    .bind(score)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// List match records for a preference, best base score first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_matches_for_preference(
    pool: &PgPool,
    preference_id: i64,
    limit: i64,
) -> Result<Vec<MatchRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, MatchRecordRow>(
        "SELECT id, preference_id, listing_id, score, is_saved, is_contacted, created_at \
         FROM match_records \
         WHERE preference_id = $1 \
         ORDER BY score DESC, id DESC \
         LIMIT $2",
    )
    .bind(preference_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Flag a listing as saved/unsaved across all of a user's match records.
///
/// A user can hold several preferences in the same city; every record
/// pairing one of them with this listing is flagged together. Returns the
/// number of records updated; zero is normal when the pair has not been
/// scored yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_matches_saved_for_user(
    pool: &PgPool,
    user_id: Uuid,
    listing_id: i64,
    is_saved: bool,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE match_records SET is_saved = $3 \
         WHERE listing_id = $2 \
           AND preference_id IN (SELECT id FROM preferences WHERE user_id = $1)",
    )
    .bind(user_id)
    .bind(listing_id)
    .bind(is_saved)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Flag a listing as contacted across all of a user's match records.
///
/// Contact is one-way: records are never un-contacted. Returns the number
/// of records updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_matches_contacted_for_user(
    pool: &PgPool,
    user_id: Uuid,
    listing_id: i64,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE match_records SET is_contacted = TRUE \
         WHERE listing_id = $2 \
           AND preference_id IN (SELECT id FROM preferences WHERE user_id = $1)",
    )
    .bind(user_id)
    .bind(listing_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
