//! Match computation pipelines.

use sqlx::PgPool;

use aqar_core::{scorer, AdjacencyGraph, MatchScore};

use crate::error::MatchingError;

/// Result of scoring one (listing, preference) pair.
#[derive(Debug)]
pub struct ComputedMatch {
    pub score: MatchScore,
    /// Whether this pass created the match record. `false` means the pair
    /// was already recorded by an earlier pass.
    pub match_created: bool,
}

/// Summary of a listing-wide rescore pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RescoreSummary {
    /// Preferences scored against the listing.
    pub scored: usize,
    /// Match records created (the rest already existed).
    pub created: usize,
}

/// Score one listing against one preference and record the match.
///
/// The record insert is idempotent per pair; recomputing an existing match
/// returns the score with `match_created = false`.
///
/// # Errors
///
/// Returns [`MatchingError::ListingNotFound`] / `PreferenceNotFound` when
/// either side is missing, [`MatchingError::InvalidPreference`] when the
/// preference cannot be scored, or [`MatchingError::Db`] on storage
/// failure.
pub async fn compute_match(
    pool: &PgPool,
    graph: &AdjacencyGraph,
    listing_id: i64,
    preference_id: i64,
) -> Result<ComputedMatch, MatchingError> {
    let listing = aqar_db::get_listing(pool, listing_id)
        .await?
        .ok_or(MatchingError::ListingNotFound(listing_id))?
        .snapshot()?;
    let preference = aqar_db::get_preference(pool, preference_id)
        .await?
        .ok_or(MatchingError::PreferenceNotFound(preference_id))?
        .profile()?;
    preference.validate()?;

    let score = scorer::score(&listing, &preference, graph);
    let inserted =
        aqar_db::insert_match_if_absent(pool, preference_id, listing_id, i32::from(score.total))
            .await?;

    tracing::debug!(
        listing_id,
        preference_id,
        score = score.total,
        created = inserted.is_some(),
        "match computed"
    );

    Ok(ComputedMatch {
        score,
        match_created: inserted.is_some(),
    })
}

/// Score a listing against every active preference in its city.
///
/// This is the new-listing flow: one bounded pass, idempotent inserts, so
/// re-running after a partial failure only fills the gaps. Preferences that
/// fail validation are logged and skipped rather than aborting the pass.
///
/// # Errors
///
/// Returns [`MatchingError::ListingNotFound`] for a missing listing or
/// [`MatchingError::Db`] on storage failure.
pub async fn rescore_listing(
    pool: &PgPool,
    graph: &AdjacencyGraph,
    listing_id: i64,
) -> Result<RescoreSummary, MatchingError> {
    let listing = aqar_db::get_listing(pool, listing_id)
        .await?
        .ok_or(MatchingError::ListingNotFound(listing_id))?
        .snapshot()?;

    let preferences =
        aqar_db::list_active_preferences_by_city(pool, &listing.city, RESCORE_BATCH_LIMIT).await?;

    let mut summary = RescoreSummary::default();
    for row in &preferences {
        let preference = match row.profile() {
            Ok(preference) => preference,
            Err(e) => {
                tracing::warn!(
                    listing_id,
                    preference_id = row.id,
                    error = %e,
                    "skipping malformed preference"
                );
                continue;
            }
        };
        if let Err(e) = preference.validate() {
            tracing::warn!(
                listing_id,
                preference_id = row.id,
                error = %e,
                "skipping unscorable preference"
            );
            continue;
        }

        let score = scorer::score(&listing, &preference, graph);
        let inserted =
            aqar_db::insert_match_if_absent(pool, row.id, listing_id, i32::from(score.total))
                .await?;

        summary.scored += 1;
        if inserted.is_some() {
            summary.created += 1;
        }
    }

    tracing::info!(
        listing_id,
        city = %listing.city,
        scored = summary.scored,
        created = summary.created,
        "listing rescore complete"
    );

    Ok(summary)
}

/// Upper bound on preferences considered in one rescore pass.
const RESCORE_BATCH_LIMIT: i64 = 1000;
