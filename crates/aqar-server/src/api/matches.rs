use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aqar_core::{blender, scorer, Identity, MatchBreakdown};

use crate::middleware::RequestId;

use super::{
    map_db_error, map_matching_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ComputeMatchRequest {
    listing_id: i64,
    preference_id: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ComputeMatchData {
    score: u8,
    breakdown: MatchBreakdown,
    match_created: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct RescoreData {
    scored: usize,
    created: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct MatchesQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct MatchItem {
    listing_id: i64,
    base_score: u8,
    final_score: u8,
    is_saved: bool,
    is_contacted: bool,
    created_at: DateTime<Utc>,
}

pub(super) async fn compute_match(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<ComputeMatchRequest>,
) -> Result<Json<ApiResponse<ComputeMatchData>>, ApiError> {
    let computed = aqar_matching::compute_match(
        &state.pool,
        &state.graph,
        payload.listing_id,
        payload.preference_id,
    )
    .await
    .map_err(|e| map_matching_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ComputeMatchData {
            score: computed.score.total,
            breakdown: computed.score.breakdown,
            match_created: computed.match_created,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn rescore_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(listing_id): Path<i64>,
) -> Result<Json<ApiResponse<RescoreData>>, ApiError> {
    let summary = aqar_matching::rescore_listing(&state.pool, &state.graph, listing_id)
        .await
        .map_err(|e| map_matching_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: RescoreData {
            scored: summary.scored,
            created: summary.created,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Ranked matches for a preference, with the owner's learned profile
/// blended in when one exists. Base scores pass through unchanged for
/// identities that have never learned or whose confidence is low.
pub(super) async fn list_preference_matches(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(preference_id): Path<i64>,
    Query(query): Query<MatchesQuery>,
) -> Result<Json<ApiResponse<Vec<MatchItem>>>, ApiError> {
    let Some(preference_row) = aqar_db::get_preference(&state.pool, preference_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("preference {preference_id} not found"),
        ));
    };
    let preference = preference_row
        .profile()
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let owner = Identity::User(preference_row.user_id);
    let learned = aqar_db::get_learned_profile(&state.pool, &owner)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .map(|row| row.profile());

    let records = aqar_db::list_matches_for_preference(
        &state.pool,
        preference_id,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut data = Vec::with_capacity(records.len());
    for record in records {
        let base_score = u8::try_from(record.score).unwrap_or(0);
        let breakdown = recompute_breakdown(&state, &preference, record.listing_id)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

        let final_score = match (&learned, &breakdown) {
            (Some(profile), Some(breakdown)) => blender::blend(base_score, breakdown, profile),
            _ => base_score,
        };

        data.push(MatchItem {
            listing_id: record.listing_id,
            base_score,
            final_score,
            is_saved: record.is_saved,
            is_contacted: record.is_contacted,
            created_at: record.created_at,
        });
    }

    data.sort_by(|a, b| {
        b.final_score
            .cmp(&a.final_score)
            .then_with(|| b.listing_id.cmp(&a.listing_id))
    });

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Re-derive the per-criterion breakdown for a recorded match. Scores are
/// reproducible from the pair plus adjacency data, so this agrees with the
/// stored total. A listing that has since vanished yields `None` and the
/// base score stands.
async fn recompute_breakdown(
    state: &AppState,
    preference: &aqar_core::PreferenceProfile,
    listing_id: i64,
) -> Result<Option<MatchBreakdown>, aqar_db::DbError> {
    let Some(row) = aqar_db::get_listing(&state.pool, listing_id).await? else {
        return Ok(None);
    };
    let Ok(listing) = row.snapshot() else {
        return Ok(None);
    };
    Ok(Some(
        scorer::score(&listing, preference, &state.graph).breakdown,
    ))
}
