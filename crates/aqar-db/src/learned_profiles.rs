//! Database operations for the `learned_profiles` table.
//!
//! One row per identity, keyed by the canonical identity key. Upserted on
//! every learning pass; never deleted while the identity exists.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aqar_core::{Identity, LearnedWeightProfile, LearnedWeights, PropertyType};

use crate::interactions::identity_columns;
use crate::DbError;

/// A row from the `learned_profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LearnedProfileRow {
    pub identity_key: String,
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub location_weight: f64,
    pub price_weight: f64,
    pub area_weight: f64,
    pub property_type_weight: f64,
    pub age_weight: f64,
    pub preferred_districts: Vec<String>,
    pub preferred_property_types: Vec<String>,
    pub price_range_min: Option<i64>,
    pub price_range_max: Option<i64>,
    pub confidence: f64,
    pub total_interactions: i32,
    pub last_updated_at: DateTime<Utc>,
}

impl LearnedProfileRow {
    /// Convert into the domain profile.
    ///
    /// Property types that fail to parse are dropped; an old row written by
    /// a newer schema should not poison the whole profile.
    #[must_use]
    pub fn profile(&self) -> LearnedWeightProfile {
        LearnedWeightProfile {
            weights: LearnedWeights {
                location: self.location_weight,
                price: self.price_weight,
                area: self.area_weight,
                property_type: self.property_type_weight,
                age: self.age_weight,
            },
            preferred_districts: self.preferred_districts.clone(),
            preferred_property_types: self
                .preferred_property_types
                .iter()
                .filter_map(|s| s.parse::<PropertyType>().ok())
                .collect(),
            price_range_min: self.price_range_min,
            price_range_max: self.price_range_max,
            confidence: self.confidence,
            total_interactions: self.total_interactions,
            last_updated_at: self.last_updated_at,
        }
    }
}

/// Fetch the learned profile for an identity, or `None` if it has never
/// been through a learning pass.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_learned_profile(
    pool: &PgPool,
    identity: &Identity,
) -> Result<Option<LearnedProfileRow>, DbError> {
    let row = sqlx::query_as::<_, LearnedProfileRow>(
        "SELECT identity_key, user_id, session_id, \
                location_weight, price_weight, area_weight, property_type_weight, age_weight, \
                preferred_districts, preferred_property_types, \
                price_range_min, price_range_max, confidence, total_interactions, last_updated_at \
         FROM learned_profiles \
         WHERE identity_key = $1",
    )
    .bind(identity.storage_key())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upsert the learned profile for an identity.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_learned_profile(
    pool: &PgPool,
    identity: &Identity,
    profile: &LearnedWeightProfile,
) -> Result<(), DbError> {
    let (user_id, session_id) = identity_columns(identity);
    let preferred_types: Vec<&str> = profile
        .preferred_property_types
        .iter()
        .map(|pt| pt.as_str())
        .collect();

    sqlx::query(
        "INSERT INTO learned_profiles \
             (identity_key, user_id, session_id, \
              location_weight, price_weight, area_weight, property_type_weight, age_weight, \
              preferred_districts, preferred_property_types, \
              price_range_min, price_range_max, confidence, total_interactions, last_updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (identity_key) DO UPDATE SET \
             location_weight          = EXCLUDED.location_weight, \
             price_weight             = EXCLUDED.price_weight, \
             area_weight              = EXCLUDED.area_weight, \
             property_type_weight     = EXCLUDED.property_type_weight, \
             age_weight               = EXCLUDED.age_weight, \
             preferred_districts      = EXCLUDED.preferred_districts, \
             preferred_property_types = EXCLUDED.preferred_property_types, \
             price_range_min          = EXCLUDED.price_range_min, \
             price_range_max          = EXCLUDED.price_range_max, \
             confidence               = EXCLUDED.confidence, \
             total_interactions       = EXCLUDED.total_interactions, \
             last_updated_at          = EXCLUDED.last_updated_at",
    )
    .bind(identity.storage_key())
    .bind(user_id)
    .bind(session_id)
    .bind(profile.weights.location)
    .bind(profile.weights.price)
    .bind(profile.weights.area)
    .bind(profile.weights.property_type)
    .bind(profile.weights.age)
    .bind(&profile.preferred_districts)
    .bind(&preferred_types)
    .bind(profile.price_range_min)
    .bind(profile.price_range_max)
    .bind(profile.confidence)
    .bind(profile.total_interactions)
    .bind(profile.last_updated_at)
    .execute(pool)
    .await?;

    Ok(())
}
