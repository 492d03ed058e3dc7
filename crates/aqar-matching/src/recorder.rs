//! Interaction recorder.
//!
//! Appends an interaction event with the listing snapshot denormalized in,
//! then runs a learning pass for the identity. Recording is best-effort at
//! the edges: an unresolvable listing is logged and skipped, never surfaced
//! as an error.

use sqlx::PgPool;

use aqar_core::{Identity, InteractionKind, ListingSnapshot};

use crate::cache::TtlCache;
use crate::error::MatchingError;
use crate::locks::IdentityLocks;
use crate::relearn::run_relearn;

/// Cache of resolved listing snapshots, keyed `listing:<id>`.
pub type ListingCache = TtlCache<ListingSnapshot>;

/// What a recording attempt did.
#[derive(Debug)]
pub enum RecordOutcome {
    /// The event was appended and a learning pass ran.
    Recorded { event_id: i64 },
    /// Nothing was written; the reason is human-readable.
    Skipped { reason: String },
}

impl RecordOutcome {
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Record one interaction and refresh the identity's learned profile.
///
/// The listing is resolved through the injected read-through cache with a
/// database fallback. An unknown listing yields `Skipped`, not an error.
/// Save, unsave, and contact events also mirror onto the user's match
/// records for the listing. The relearn pass runs under the identity's
/// lock so concurrent recordings for the same identity cannot race on the
/// profile row.
///
/// # Errors
///
/// Returns [`MatchingError::Db`] only for storage failures; those are the
/// caller's to retry.
pub async fn record_interaction(
    pool: &PgPool,
    cache: &ListingCache,
    locks: &IdentityLocks,
    identity: &Identity,
    listing_id: i64,
    kind: InteractionKind,
    duration_secs: Option<i32>,
) -> Result<RecordOutcome, MatchingError> {
    let Some(snapshot) = resolve_listing(pool, cache, listing_id).await? else {
        tracing::warn!(
            identity = %identity.storage_key(),
            listing_id,
            kind = kind.as_str(),
            "interaction references unknown listing, skipping"
        );
        return Ok(RecordOutcome::Skipped {
            reason: format!("listing {listing_id} not found"),
        });
    };

    let event_id =
        aqar_db::insert_interaction(pool, identity, listing_id, kind, duration_secs, &snapshot)
            .await?;

    tracing::debug!(
        identity = %identity.storage_key(),
        listing_id,
        kind = kind.as_str(),
        event_id,
        "interaction recorded"
    );

    sync_match_flags(pool, identity, listing_id, kind).await?;

    let lock = locks.for_identity(identity);
    let _guard = lock.lock().await;
    run_relearn(pool, identity).await?;

    Ok(RecordOutcome::Recorded { event_id })
}

/// Mirror save/unsave/contact actions onto the user's match records.
///
/// Anonymous sessions own no preferences and therefore no match records;
/// their events only feed the learner. Zero updated records is normal when
/// the pair has not been scored yet.
async fn sync_match_flags(
    pool: &PgPool,
    identity: &Identity,
    listing_id: i64,
    kind: InteractionKind,
) -> Result<(), MatchingError> {
    let Identity::User(user_id) = identity else {
        return Ok(());
    };

    let updated = match kind {
        InteractionKind::Save => {
            aqar_db::set_matches_saved_for_user(pool, *user_id, listing_id, true).await?
        }
        InteractionKind::Unsave => {
            aqar_db::set_matches_saved_for_user(pool, *user_id, listing_id, false).await?
        }
        InteractionKind::Contact => {
            aqar_db::set_matches_contacted_for_user(pool, *user_id, listing_id).await?
        }
        InteractionKind::View | InteractionKind::Skip | InteractionKind::Share => return Ok(()),
    };

    if updated > 0 {
        tracing::debug!(
            user_id = %user_id,
            listing_id,
            kind = kind.as_str(),
            updated,
            "match record flags synced"
        );
    }
    Ok(())
}

/// Resolve a listing snapshot, cache first, database second.
///
/// A row whose stored property type the domain no longer recognizes is
/// treated as unresolvable rather than failing the recording.
async fn resolve_listing(
    pool: &PgPool,
    cache: &ListingCache,
    listing_id: i64,
) -> Result<Option<ListingSnapshot>, MatchingError> {
    let key = format!("listing:{listing_id}");
    if let Some(snapshot) = cache.get(&key) {
        return Ok(Some(snapshot));
    }

    let Some(row) = aqar_db::get_listing(pool, listing_id).await? else {
        return Ok(None);
    };

    match row.snapshot() {
        Ok(snapshot) => {
            cache.insert(key, snapshot.clone());
            Ok(Some(snapshot))
        }
        Err(e) => {
            tracing::warn!(listing_id, error = %e, "stored listing is malformed");
            Ok(None)
        }
    }
}
