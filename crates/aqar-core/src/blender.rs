//! Confidence-gated score blending.
//!
//! Combines a base match score with an identity's learned weights. Below
//! the confidence gate the base score passes through untouched; above it,
//! the learned adjustment contributes at most 40% of the final score.

use crate::scorer::{AREA_CAP, LOCATION_CAP, PRICE_CAP, PROPERTY_TYPE_CAP};
use crate::types::{LearnedWeightProfile, MatchBreakdown};

/// Profiles below this confidence never influence scores.
pub const CONFIDENCE_GATE: f64 = 0.2;
/// Learning contributes at most this share of the final score.
pub const MAX_BLEND_SHARE: f64 = 0.4;

pub const RUBRIC_LOCATION_WEIGHT: f64 = 0.25;
pub const RUBRIC_PRICE_WEIGHT: f64 = 0.20;
pub const RUBRIC_AREA_WEIGHT: f64 = 0.10;
pub const RUBRIC_PROPERTY_TYPE_WEIGHT: f64 = 0.15;

/// Blend a base score with a learned profile.
///
/// Each evaluated sub-score is normalized by its rubric cap, weighted by
/// the rubric weight times the matching learned weight, and averaged over
/// the total weight actually used; the result is scaled back to 0–100 and
/// mixed in at `confidence x 0.4`.
#[must_use]
pub fn blend(base: u8, breakdown: &MatchBreakdown, profile: &LearnedWeightProfile) -> u8 {
    if profile.confidence < CONFIDENCE_GATE {
        return base;
    }

    let mut weighted_sum = 0.0;
    let mut weight_used = 0.0;

    let mut fold = |sub: Option<f64>, cap: f64, rubric: f64, learned: f64| {
        if let Some(points) = sub {
            let weight = rubric * learned;
            weighted_sum += weight * (points / cap);
            weight_used += weight;
        }
    };

    fold(
        Some(breakdown.location),
        LOCATION_CAP,
        RUBRIC_LOCATION_WEIGHT,
        profile.weights.location,
    );
    fold(
        breakdown.price,
        PRICE_CAP,
        RUBRIC_PRICE_WEIGHT,
        profile.weights.price,
    );
    fold(
        breakdown.area,
        AREA_CAP,
        RUBRIC_AREA_WEIGHT,
        profile.weights.area,
    );
    fold(
        Some(breakdown.property_type),
        PROPERTY_TYPE_CAP,
        RUBRIC_PROPERTY_TYPE_WEIGHT,
        profile.weights.property_type,
    );

    if weight_used == 0.0 {
        return base;
    }

    let adjusted = (weighted_sum / weight_used) * 100.0;
    let blend_factor = profile.confidence * MAX_BLEND_SHARE;
    let final_score = (f64::from(base) * (1.0 - blend_factor) + adjusted * blend_factor)
        .round()
        .clamp(0.0, 100.0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let final_score = final_score as u8;
    final_score
}
