//! Deterministic 100-point match scorer.
//!
//! Three independently capped sub-scores: location (40), price (30), and
//! specs (30, itself split into property type 15 + rooms 7.5 + area 7.5).
//! Pure and side-effect free; persisting the resulting match record is the
//! caller's responsibility.

use crate::adjacency::AdjacencyGraph;
use crate::types::{ListingSnapshot, MatchBreakdown, MatchScore, PreferenceProfile};

pub const LOCATION_CAP: f64 = 40.0;
pub const PRICE_CAP: f64 = 30.0;
pub const SPECS_CAP: f64 = 30.0;
pub const PROPERTY_TYPE_CAP: f64 = 15.0;
pub const ROOMS_CAP: f64 = 7.5;
pub const AREA_CAP: f64 = 7.5;

const LOCATION_EXACT: f64 = 40.0;
const LOCATION_ADJACENT: f64 = 25.0;
const LOCATION_NO_PREFERENCE: f64 = 20.0;
const LOCATION_SAME_CITY: f64 = 15.0;

const PRICE_WITHIN_BUDGET: f64 = 30.0;
const PRICE_BELOW_FLOOR: f64 = 25.0;
const PRICE_STRETCH_5PCT: f64 = 20.0;
const PRICE_STRETCH_15PCT: f64 = 10.0;
const PRICE_NO_BUDGET: f64 = 15.0;

const PROPERTY_TYPE_EXACT: f64 = 15.0;
const PROPERTY_TYPE_SIMILAR: f64 = 8.0;

/// Score one listing against one preference.
///
/// A city mismatch returns 0 immediately: partial credit never crosses
/// cities. Sub-scores for criteria that cannot be evaluated (missing
/// rooms/area on either side, no stated budget ceiling) are recorded as
/// `None` in the breakdown; the no-budget case still contributes its flat
/// credit to the total.
#[must_use]
pub fn score(
    listing: &ListingSnapshot,
    preference: &PreferenceProfile,
    graph: &AdjacencyGraph,
) -> MatchScore {
    if listing.city != preference.city {
        return MatchScore {
            total: 0,
            breakdown: MatchBreakdown {
                location: 0.0,
                price: None,
                property_type: 0.0,
                rooms: None,
                area: None,
            },
        };
    }

    let location = location_score(listing, preference, graph).min(LOCATION_CAP);
    let price = price_score(listing.price, preference);
    let property_type = property_type_score(listing, preference);
    let rooms = rooms_score(listing.rooms, preference.rooms);
    let area = area_score(listing.area_sqm, preference.area_sqm);

    let breakdown = MatchBreakdown {
        location,
        price,
        property_type,
        rooms,
        area,
    };

    let price_points = price.unwrap_or(PRICE_NO_BUDGET).min(PRICE_CAP);
    let specs_points = breakdown.specs().min(SPECS_CAP);
    let total = (location + price_points + specs_points)
        .round()
        .clamp(0.0, 100.0);

    // The clamp above bounds the value into u8 range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = total as u8;

    MatchScore { total, breakdown }
}

fn location_score(
    listing: &ListingSnapshot,
    preference: &PreferenceProfile,
    graph: &AdjacencyGraph,
) -> f64 {
    if preference.districts.is_empty() {
        return LOCATION_NO_PREFERENCE;
    }
    if preference.districts.iter().any(|d| *d == listing.district) {
        return LOCATION_EXACT;
    }
    if preference
        .districts
        .iter()
        .any(|d| graph.are_adjacent(&listing.city, d, &listing.district))
    {
        return LOCATION_ADJACENT;
    }
    LOCATION_SAME_CITY
}

/// `None` when the preference states no budget ceiling; the scorer treats
/// that as the flat 15-point credit, outside the blendable breakdown.
fn price_score(price: i64, preference: &PreferenceProfile) -> Option<f64> {
    let Some(budget_max) = preference.budget_max else {
        return None;
    };

    #[allow(clippy::cast_precision_loss)]
    let (price_f, max_f) = (price as f64, budget_max as f64);

    let points = if price <= budget_max {
        match preference.budget_min {
            Some(min) if price < min => PRICE_BELOW_FLOOR,
            _ => PRICE_WITHIN_BUDGET,
        }
    } else if price_f <= max_f * 1.05 {
        PRICE_STRETCH_5PCT
    } else if price_f <= max_f * 1.15 {
        PRICE_STRETCH_15PCT
    } else {
        0.0
    };

    Some(points.min(PRICE_CAP))
}

fn property_type_score(listing: &ListingSnapshot, preference: &PreferenceProfile) -> f64 {
    if listing.property_type == preference.property_type {
        PROPERTY_TYPE_EXACT
    } else if listing.property_type.is_similar_to(preference.property_type) {
        PROPERTY_TYPE_SIMILAR
    } else {
        0.0
    }
}

fn rooms_score(listing_rooms: Option<i32>, wanted_rooms: Option<i32>) -> Option<f64> {
    let (have, want) = (listing_rooms?, wanted_rooms?);
    let diff = (have - want).abs();
    let points = match diff {
        0 => 7.5,
        1 => 5.0,
        2 => 2.5,
        _ => 0.0,
    };
    Some(points)
}

fn area_score(listing_area: Option<i32>, wanted_area: Option<i32>) -> Option<f64> {
    let (have, want) = (listing_area?, wanted_area?);
    if want <= 0 {
        return None;
    }
    // Integer arithmetic keeps the band boundaries exact: a listing at
    // precisely +10% must land in the top band, which float division of
    // the ratio gets wrong.
    let diff = (i64::from(have) - i64::from(want)).abs();
    let want = i64::from(want);
    let points = if diff * 10 <= want {
        7.5
    } else if diff * 5 <= want {
        5.0
    } else if diff * 10 <= 3 * want {
        2.5
    } else {
        0.0
    };
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PropertyType;
    use std::collections::HashMap;

    fn riyadh_graph() -> AdjacencyGraph {
        let mut districts = HashMap::new();
        districts.insert(
            "Al Narjis".to_string(),
            vec!["Al Yasmin".to_string(), "Al Arid".to_string()],
        );
        districts.insert("Al Yasmin".to_string(), vec!["Al Malqa".to_string()]);
        districts.insert("Al Malqa".to_string(), vec![]);
        let mut cities = HashMap::new();
        cities.insert("Riyadh".to_string(), districts);
        AdjacencyGraph::from_map(cities)
    }

    fn narjis_villa() -> ListingSnapshot {
        ListingSnapshot {
            city: "Riyadh".to_string(),
            district: "Al Narjis".to_string(),
            price: 900_000,
            property_type: PropertyType::Villa,
            rooms: Some(4),
            area_sqm: Some(350),
            is_active: true,
        }
    }

    fn villa_preference() -> PreferenceProfile {
        PreferenceProfile {
            city: "Riyadh".to_string(),
            districts: vec!["Al Narjis".to_string(), "Al Yasmin".to_string()],
            property_type: PropertyType::Villa,
            budget_min: None,
            budget_max: Some(1_000_000),
            rooms: Some(4),
            area_sqm: Some(350),
            is_active: true,
        }
    }

    #[test]
    fn exact_match_scores_full_hundred() {
        let result = score(&narjis_villa(), &villa_preference(), &riyadh_graph());
        assert_eq!(result.total, 100);
        assert!((result.breakdown.location - 40.0).abs() < f64::EPSILON);
        assert_eq!(result.breakdown.price, Some(30.0));
        assert!((result.breakdown.specs() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn city_mismatch_always_zero() {
        let mut pref = villa_preference();
        pref.city = "Jeddah".to_string();
        let result = score(&narjis_villa(), &pref, &riyadh_graph());
        assert_eq!(result.total, 0);
        assert!(result.breakdown.location.abs() < f64::EPSILON);
        assert_eq!(result.breakdown.price, None);
    }

    #[test]
    fn adjacent_district_scores_twenty_five() {
        let mut pref = villa_preference();
        pref.districts = vec!["Al Yasmin".to_string()];
        let result = score(&narjis_villa(), &pref, &riyadh_graph());
        assert!((result.breakdown.location - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn adjacency_credit_works_in_reverse_direction() {
        // Al Malqa lists no neighbors; Al Yasmin lists Al Malqa.
        let mut listing = narjis_villa();
        listing.district = "Al Malqa".to_string();
        let mut pref = villa_preference();
        pref.districts = vec!["Al Yasmin".to_string()];
        let result = score(&listing, &pref, &riyadh_graph());
        assert!((result.breakdown.location - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_districts_scores_twenty() {
        let mut pref = villa_preference();
        pref.districts = vec![];
        let result = score(&narjis_villa(), &pref, &riyadh_graph());
        assert!((result.breakdown.location - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrelated_district_scores_same_city_fifteen() {
        let mut listing = narjis_villa();
        listing.district = "Al Malqa".to_string();
        let mut pref = villa_preference();
        pref.districts = vec!["Al Arid".to_string()];
        let result = score(&listing, &pref, &riyadh_graph());
        assert!((result.breakdown.location - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_ten_percent_over_budget_scores_ten() {
        let mut listing = narjis_villa();
        listing.price = 1_100_000;
        let result = score(&listing, &villa_preference(), &riyadh_graph());
        assert_eq!(result.breakdown.price, Some(10.0));
    }

    #[test]
    fn price_within_five_percent_stretch_scores_twenty() {
        let mut listing = narjis_villa();
        listing.price = 1_050_000;
        let result = score(&listing, &villa_preference(), &riyadh_graph());
        assert_eq!(result.breakdown.price, Some(20.0));
    }

    #[test]
    fn price_beyond_fifteen_percent_scores_zero() {
        let mut listing = narjis_villa();
        listing.price = 1_200_000;
        let result = score(&listing, &villa_preference(), &riyadh_graph());
        assert_eq!(result.breakdown.price, Some(0.0));
    }

    #[test]
    fn price_below_stated_floor_scores_twenty_five() {
        let mut pref = villa_preference();
        pref.budget_min = Some(950_000);
        let result = score(&narjis_villa(), &pref, &riyadh_graph());
        assert_eq!(result.breakdown.price, Some(25.0));
    }

    #[test]
    fn no_budget_ceiling_gives_flat_fifteen_credit() {
        let mut pref = villa_preference();
        pref.budget_max = None;
        let result = score(&narjis_villa(), &pref, &riyadh_graph());
        assert_eq!(result.breakdown.price, None);
        // 40 location + 15 flat price + 30 specs
        assert_eq!(result.total, 85);
    }

    #[test]
    fn similar_property_type_scores_eight() {
        let mut listing = narjis_villa();
        listing.property_type = PropertyType::Duplex;
        let result = score(&listing, &villa_preference(), &riyadh_graph());
        assert!((result.breakdown.property_type - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rooms_bands() {
        assert_eq!(rooms_score(Some(4), Some(4)), Some(7.5));
        assert_eq!(rooms_score(Some(5), Some(4)), Some(5.0));
        assert_eq!(rooms_score(Some(6), Some(4)), Some(2.5));
        assert_eq!(rooms_score(Some(8), Some(4)), Some(0.0));
        assert_eq!(rooms_score(None, Some(4)), None);
        assert_eq!(rooms_score(Some(4), None), None);
    }

    #[test]
    fn area_bands() {
        assert_eq!(area_score(Some(350), Some(350)), Some(7.5));
        assert_eq!(area_score(Some(385), Some(350)), Some(7.5)); // exactly +10%
        assert_eq!(area_score(Some(420), Some(350)), Some(5.0)); // +20%
        assert_eq!(area_score(Some(450), Some(350)), Some(2.5)); // ~+28.6%
        assert_eq!(area_score(Some(500), Some(350)), Some(0.0));
        assert_eq!(area_score(Some(350), Some(0)), None);
        assert_eq!(area_score(None, Some(350)), None);
    }

    #[test]
    fn area_band_edges_are_inclusive() {
        // Exact deviations must land in the better band on both sides.
        assert_eq!(area_score(Some(385), Some(350)), Some(7.5)); // +10% exactly
        assert_eq!(area_score(Some(315), Some(350)), Some(7.5)); // -10% exactly
        assert_eq!(area_score(Some(420), Some(350)), Some(5.0)); // +20% exactly
        assert_eq!(area_score(Some(455), Some(350)), Some(2.5)); // +30% exactly
        assert_eq!(area_score(Some(456), Some(350)), Some(0.0));
    }

    #[test]
    fn total_never_exceeds_hundred() {
        // Max everything; sub-caps keep the sum at exactly 100.
        let result = score(&narjis_villa(), &villa_preference(), &riyadh_graph());
        assert!(result.total <= 100);
    }

    #[test]
    fn half_point_specs_round_in_total() {
        // Rooms off by one (5.0) + area missing: specs = 15 + 5 = 20.
        let mut listing = narjis_villa();
        listing.rooms = Some(5);
        listing.area_sqm = None;
        let result = score(&listing, &villa_preference(), &riyadh_graph());
        // 40 + 30 + 20 = 90
        assert_eq!(result.total, 90);
    }
}
