//! Online preference weight learner.
//!
//! Recomputes a [`LearnedWeightProfile`] from the identity's recent
//! interaction window. The function here is pure over (previous profile,
//! event window, now); loading the window and persisting the result is the
//! pipeline crate's job. Replaying the same window against the same stored
//! profile yields an identical profile.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::{
    InteractionKind, InteractionSample, LearnedWeightProfile, LearnedWeights, PropertyType,
};

pub const LEARNING_RATE: f64 = 0.1;
pub const WEIGHT_DECAY: f64 = 0.95;
pub const WEIGHT_MIN: f64 = 0.3;
pub const WEIGHT_MAX: f64 = 2.0;
/// Interactions below this leave the confidence gate closed.
pub const MIN_INTERACTIONS: usize = 5;
/// Confidence saturates at 4x the minimum-interactions constant.
pub const CONFIDENCE_FULL_AT: usize = 4 * MIN_INTERACTIONS;
pub const WINDOW_DAYS: i64 = 30;
pub const WINDOW_LIMIT: i64 = 100;
pub const MAX_PREFERRED_DISTRICTS: usize = 5;
pub const MAX_PREFERRED_TYPES: usize = 3;
/// Views shorter than this carry no signal.
pub const VIEW_DWELL_THRESHOLD_SECS: i32 = 30;
const MIN_PRICE_SAMPLES: usize = 3;
const POSITIVE_VOTE: f64 = 1.0;
const NEGATIVE_VOTE: f64 = -0.5;

/// Reward signal for a single interaction.
///
/// Views only count when the user dwelt longer than 30 seconds.
#[must_use]
pub fn reward(kind: InteractionKind, duration_secs: Option<i32>) -> f64 {
    match kind {
        InteractionKind::Contact => 0.30,
        InteractionKind::Save => 0.15,
        InteractionKind::Share => 0.12,
        InteractionKind::Skip => -0.08,
        InteractionKind::Unsave => -0.075,
        InteractionKind::View => {
            if duration_secs.is_some_and(|d| d > VIEW_DWELL_THRESHOLD_SECS) {
                0.02
            } else {
                0.0
            }
        }
    }
}

/// Recompute a profile from the interaction window.
///
/// Returns `None` when the window is empty: a profile with zero
/// interactions is never created or modified. Otherwise:
///
/// 1. Start from `previous` or the initial profile.
/// 2. Decay each scalar weight toward 1.0 once per pass.
/// 3. Apply a reward-scaled update per event and attribute, accumulating
///    district / property-type tallies.
/// 4. Clamp weights to [0.3, 2.0]; derive preferred lists, the inferred
///    price range, and the window-scoped confidence.
#[must_use]
pub fn relearn(
    previous: Option<&LearnedWeightProfile>,
    events: &[InteractionSample],
    now: DateTime<Utc>,
) -> Option<LearnedWeightProfile> {
    if events.is_empty() {
        return None;
    }

    let mut profile = previous
        .cloned()
        .unwrap_or_else(|| LearnedWeightProfile::initial(now));

    decay_weights(&mut profile.weights);

    // BTreeMap keeps tally iteration deterministic across runs.
    let mut district_tallies: BTreeMap<String, f64> = BTreeMap::new();
    let mut type_tallies: BTreeMap<PropertyType, f64> = BTreeMap::new();
    let mut liked_prices: Vec<i64> = Vec::new();

    for event in events {
        let r = reward(event.kind, event.duration_secs);
        let step = LEARNING_RATE * r;

        if let Some(district) = &event.district {
            profile.weights.location += step;
            if r != 0.0 {
                let vote = if r > 0.0 { POSITIVE_VOTE } else { NEGATIVE_VOTE };
                *district_tallies.entry(district.clone()).or_insert(0.0) += vote;
            }
        }
        if let Some(price) = event.price {
            profile.weights.price += step;
            if r > 0.0 {
                liked_prices.push(price);
            }
        }
        if event.area_sqm.is_some() {
            profile.weights.area += step;
        }
        if let Some(property_type) = event.property_type {
            profile.weights.property_type += step;
            if r != 0.0 {
                let vote = if r > 0.0 { POSITIVE_VOTE } else { NEGATIVE_VOTE };
                *type_tallies.entry(property_type).or_insert(0.0) += vote;
            }
        }
    }

    clamp_weights(&mut profile.weights);

    profile.preferred_districts = top_tallies(&district_tallies, MAX_PREFERRED_DISTRICTS);
    profile.preferred_property_types = top_tallies(&type_tallies, MAX_PREFERRED_TYPES);

    if liked_prices.len() >= MIN_PRICE_SAMPLES {
        liked_prices.sort_unstable();
        profile.price_range_min = Some(nearest_rank_percentile(&liked_prices, 10));
        profile.price_range_max = Some(nearest_rank_percentile(&liked_prices, 90));
    }

    #[allow(clippy::cast_precision_loss)]
    let confidence = (events.len() as f64 / CONFIDENCE_FULL_AT as f64).min(1.0);
    profile.confidence = confidence;
    profile.total_interactions = i32::try_from(events.len()).unwrap_or(i32::MAX);
    profile.last_updated_at = now;

    Some(profile)
}

fn decay_weights(weights: &mut LearnedWeights) {
    let decay = |w: f64| 1.0 + (w - 1.0) * WEIGHT_DECAY;
    weights.location = decay(weights.location);
    weights.price = decay(weights.price);
    weights.area = decay(weights.area);
    weights.property_type = decay(weights.property_type);
    weights.age = decay(weights.age);
}

fn clamp_weights(weights: &mut LearnedWeights) {
    weights.location = weights.location.clamp(WEIGHT_MIN, WEIGHT_MAX);
    weights.price = weights.price.clamp(WEIGHT_MIN, WEIGHT_MAX);
    weights.area = weights.area.clamp(WEIGHT_MIN, WEIGHT_MAX);
    weights.property_type = weights.property_type.clamp(WEIGHT_MIN, WEIGHT_MAX);
    weights.age = weights.age.clamp(WEIGHT_MIN, WEIGHT_MAX);
}

/// Keys with a positive tally, ordered by tally descending then key
/// ascending, truncated to `limit`.
fn top_tallies<K: Ord + Clone>(tallies: &BTreeMap<K, f64>, limit: usize) -> Vec<K> {
    let mut positive: Vec<(&K, f64)> = tallies
        .iter()
        .filter(|(_, tally)| **tally > 0.0)
        .map(|(key, tally)| (key, *tally))
        .collect();
    positive.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    positive.into_iter().take(limit).map(|(k, _)| k.clone()).collect()
}

/// Nearest-rank percentile over an ascending-sorted slice.
fn nearest_rank_percentile(sorted: &[i64], percentile: u32) -> i64 {
    debug_assert!(!sorted.is_empty());
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rank = ((f64::from(percentile) / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.max(1) - 1]
}
