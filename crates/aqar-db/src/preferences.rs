//! Database operations for the `preferences` table.
//!
//! Preferences are soft-disabled (`is_active = false`) rather than deleted;
//! match records may still reference them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aqar_core::{PreferenceProfile, PropertyType};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `preferences` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PreferenceRow {
    pub id: i64,
    pub user_id: Uuid,
    pub city: String,
    pub districts: Vec<String>,
    pub property_type: String,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub rooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceRow {
    /// Convert into the typed profile used by the scorer.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if `property_type` holds a value
    /// the domain enum does not know.
    pub fn profile(&self) -> Result<PreferenceProfile, DbError> {
        let property_type: PropertyType =
            self.property_type
                .parse()
                .map_err(|_| DbError::InvalidColumn {
                    column: "preferences.property_type".to_string(),
                    value: self.property_type.clone(),
                })?;

        Ok(PreferenceProfile {
            city: self.city.clone(),
            districts: self.districts.clone(),
            property_type,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            rooms: self.rooms,
            area_sqm: self.area_sqm,
            is_active: self.is_active,
        })
    }
}

/// Insert payload for a new preference profile.
#[derive(Debug, Clone)]
pub struct NewPreference {
    pub user_id: Uuid,
    pub city: String,
    pub districts: Vec<String>,
    pub property_type: PropertyType,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub rooms: Option<i32>,
    pub area_sqm: Option<i32>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch a preference by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_preference(
    pool: &PgPool,
    preference_id: i64,
) -> Result<Option<PreferenceRow>, DbError> {
    let row = sqlx::query_as::<_, PreferenceRow>(
        "SELECT id, user_id, city, districts, property_type, budget_min, budget_max, \
                rooms, area_sqm, is_active, created_at, updated_at \
         FROM preferences \
         WHERE id = $1",
    )
    .bind(preference_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List active preferences for a city, oldest first.
///
/// Used by the rescore pipeline when a new listing arrives; bounded by
/// `limit` to keep a single pass small.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_preferences_by_city(
    pool: &PgPool,
    city: &str,
    limit: i64,
) -> Result<Vec<PreferenceRow>, DbError> {
    let rows = sqlx::query_as::<_, PreferenceRow>(
        "SELECT id, user_id, city, districts, property_type, budget_min, budget_max, \
                rooms, area_sqm, is_active, created_at, updated_at \
         FROM preferences \
         WHERE city = $1 AND is_active = TRUE \
         ORDER BY id \
         LIMIT $2",
    )
    .bind(city)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert a new preference and return its generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_preference(pool: &PgPool, preference: &NewPreference) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO preferences \
             (user_id, city, districts, property_type, budget_min, budget_max, rooms, area_sqm) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(preference.user_id)
    .bind(&preference.city)
    .bind(&preference.districts)
    .bind(preference.property_type.as_str())
    .bind(preference.budget_min)
    .bind(preference.budget_max)
    .bind(preference.rooms)
    .bind(preference.area_sqm)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Activate or soft-disable a preference.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no preference has the id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_preference_active(
    pool: &PgPool,
    preference_id: i64,
    is_active: bool,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE preferences SET is_active = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(preference_id)
    .bind(is_active)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
