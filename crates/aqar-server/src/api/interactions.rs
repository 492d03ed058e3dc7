use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aqar_core::{numeric, Identity, InteractionKind};
use aqar_matching::RecordOutcome;

use crate::middleware::RequestId;

use super::{map_matching_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RecordInteractionRequest {
    user_id: Option<Uuid>,
    session_id: Option<String>,
    listing_id: i64,
    kind: InteractionKind,
    /// Upstream clients sometimes send this as a string; unparseable
    /// values are treated as absent.
    #[serde(default, deserialize_with = "numeric::lenient_i32")]
    duration_secs: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecordInteractionData {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub(super) async fn record_interaction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<RecordInteractionRequest>,
) -> Result<Json<ApiResponse<RecordInteractionData>>, ApiError> {
    let identity = match (payload.user_id, payload.session_id) {
        (Some(user_id), None) => Identity::User(user_id),
        (None, Some(session_id)) if !session_id.trim().is_empty() => {
            Identity::Session(session_id)
        }
        _ => {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "exactly one of user_id or session_id is required",
            ));
        }
    };

    let outcome = aqar_matching::record_interaction(
        &state.pool,
        &state.listing_cache,
        &state.locks,
        &identity,
        payload.listing_id,
        payload.kind,
        payload.duration_secs,
    )
    .await
    .map_err(|e| map_matching_error(req_id.0.clone(), &e))?;

    let data = match outcome {
        RecordOutcome::Recorded { .. } => RecordInteractionData {
            status: "recorded",
            reason: None,
        },
        RecordOutcome::Skipped { reason } => RecordInteractionData {
            status: "skipped",
            reason: Some(reason),
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
