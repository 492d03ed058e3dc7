//! Relearn pipeline: rolling interaction window in, learned profile out.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use aqar_core::learner::{self, WINDOW_DAYS, WINDOW_LIMIT};
use aqar_core::{Identity, InteractionSample, LearnedWeightProfile};

use crate::error::MatchingError;

/// Run one learning pass for an identity.
///
/// 1. Load the newest events within the trailing 30-day window (capped at
///    100 rows).
/// 2. Feed them through [`learner::relearn`] together with the stored
///    profile, if any.
/// 3. Upsert the result.
///
/// An empty window is a no-op: nothing is created or touched and `None` is
/// returned. Rows that fail to convert into samples are logged and skipped.
///
/// Callers that might race on the same identity must hold its
/// [`crate::IdentityLocks`] guard across this call.
///
/// # Errors
///
/// Returns [`MatchingError::Db`] if a query or the upsert fails.
pub async fn run_relearn(
    pool: &PgPool,
    identity: &Identity,
) -> Result<Option<LearnedWeightProfile>, MatchingError> {
    let now = Utc::now();
    let since = now - Duration::days(WINDOW_DAYS);
    let rows = aqar_db::list_recent_interactions(pool, identity, since, WINDOW_LIMIT).await?;

    let samples: Vec<InteractionSample> = rows
        .iter()
        .filter_map(|row| match row.sample() {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::warn!(
                    identity = %identity.storage_key(),
                    event_id = row.id,
                    error = %e,
                    "skipping malformed interaction row"
                );
                None
            }
        })
        .collect();

    if samples.is_empty() {
        tracing::debug!(
            identity = %identity.storage_key(),
            "no interactions in window, skipping learning pass"
        );
        return Ok(None);
    }

    let previous = aqar_db::get_learned_profile(pool, identity)
        .await?
        .map(|row| row.profile());

    let Some(updated) = learner::relearn(previous.as_ref(), &samples, now) else {
        return Ok(None);
    };

    aqar_db::upsert_learned_profile(pool, identity, &updated).await?;

    tracing::info!(
        identity = %identity.storage_key(),
        interactions = updated.total_interactions,
        confidence = updated.confidence,
        "learning pass complete"
    );

    Ok(Some(updated))
}
