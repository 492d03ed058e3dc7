//! Database operations for the `listings` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use aqar_core::{ListingSnapshot, PropertyType};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `listings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub city: String,
    pub district: String,
    /// Whole SAR.
    pub price: i64,
    pub property_type: String,
    pub rooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingRow {
    /// Convert into the typed snapshot used by the scorer and recorder.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if `property_type` holds a value
    /// the domain enum does not know.
    pub fn snapshot(&self) -> Result<ListingSnapshot, DbError> {
        let property_type: PropertyType =
            self.property_type
                .parse()
                .map_err(|_| DbError::InvalidColumn {
                    column: "listings.property_type".to_string(),
                    value: self.property_type.clone(),
                })?;

        Ok(ListingSnapshot {
            city: self.city.clone(),
            district: self.district.clone(),
            price: self.price,
            property_type,
            rooms: self.rooms,
            area_sqm: self.area_sqm,
            is_active: self.is_active,
        })
    }
}

/// Insert payload for a new listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub city: String,
    pub district: String,
    pub price: i64,
    pub property_type: PropertyType,
    pub rooms: Option<i32>,
    pub area_sqm: Option<i32>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch a listing by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_listing(pool: &PgPool, listing_id: i64) -> Result<Option<ListingRow>, DbError> {
    let row = sqlx::query_as::<_, ListingRow>(
        "SELECT id, city, district, price, property_type, rooms, area_sqm, \
                is_active, created_at, updated_at \
         FROM listings \
         WHERE id = $1",
    )
    .bind(listing_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a new listing and return its generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_listing(pool: &PgPool, listing: &NewListing) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO listings (city, district, price, property_type, rooms, area_sqm) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(&listing.city)
    .bind(&listing.district)
    .bind(listing.price)
    .bind(listing.property_type.as_str())
    .bind(listing.rooms)
    .bind(listing.area_sqm)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Activate or soft-disable a listing.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no listing has the id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_listing_active(
    pool: &PgPool,
    listing_id: i64,
    is_active: bool,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE listings SET is_active = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(listing_id)
    .bind(is_active)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
