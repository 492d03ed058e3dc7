use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use aqar_core::{numeric, PropertyType};
use aqar_db::NewListing;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateListingRequest {
    city: String,
    district: String,
    /// Upstream feeds send prices as numbers or numeric strings.
    #[serde(default, deserialize_with = "numeric::lenient_i64")]
    price: Option<i64>,
    property_type: PropertyType,
    #[serde(default, deserialize_with = "numeric::lenient_i32")]
    rooms: Option<i32>,
    #[serde(default, deserialize_with = "numeric::lenient_i32")]
    area_sqm: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateListingData {
    listing_id: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct DeactivateListingData {
    listing_id: i64,
    is_active: bool,
}

pub(super) async fn create_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<Json<ApiResponse<CreateListingData>>, ApiError> {
    let listing = validate_payload(payload).map_err(|message| {
        ApiError::new(req_id.0.clone(), "validation_error", message)
    })?;

    let listing_id = aqar_db::insert_listing(&state.pool, &listing)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        listing_id,
        city = %listing.city,
        district = %listing.district,
        "listing created"
    );

    Ok(Json(ApiResponse {
        data: CreateListingData { listing_id },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Soft-disable a listing; the row and its match records stay queryable.
pub(super) async fn deactivate_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(listing_id): Path<i64>,
) -> Result<Json<ApiResponse<DeactivateListingData>>, ApiError> {
    match aqar_db::set_listing_active(&state.pool, listing_id, false).await {
        Ok(()) => Ok(Json(ApiResponse {
            data: DeactivateListingData {
                listing_id,
                is_active: false,
            },
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(aqar_db::DbError::NotFound) => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("listing {listing_id} not found"),
        )),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

fn validate_payload(payload: CreateListingRequest) -> Result<NewListing, String> {
    let city = payload.city.trim().to_string();
    if city.is_empty() {
        return Err("city is required".to_string());
    }
    let district = payload.district.trim().to_string();
    if district.is_empty() {
        return Err("district is required".to_string());
    }
    let price = match payload.price {
        Some(price) if price > 0 => price,
        Some(_) => return Err("price must be positive".to_string()),
        None => return Err("price is required".to_string()),
    };

    Ok(NewListing {
        city,
        district,
        price,
        property_type: payload.property_type,
        rooms: payload.rooms.filter(|r| *r > 0),
        area_sqm: payload.area_sqm.filter(|a| *a > 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(price: serde_json::Value) -> CreateListingRequest {
        serde_json::from_value(serde_json::json!({
            "city": "Riyadh",
            "district": "Al Narjis",
            "price": price,
            "property_type": "villa",
            "rooms": 4,
            "area_sqm": 350
        }))
        .expect("request should deserialize")
    }

    #[test]
    fn numeric_string_price_is_accepted() {
        let listing = validate_payload(request(serde_json::json!("900000"))).expect("valid");
        assert_eq!(listing.price, 900_000);
        assert_eq!(listing.rooms, Some(4));
    }

    #[test]
    fn garbage_price_is_rejected() {
        let err = validate_payload(request(serde_json::json!("a lot"))).expect_err("invalid");
        assert_eq!(err, "price is required");
    }

    #[test]
    fn blank_city_is_rejected() {
        let mut payload = request(serde_json::json!(900_000));
        payload.city = "   ".to_string();
        let err = validate_payload(payload).expect_err("invalid");
        assert_eq!(err, "city is required");
    }
}
