use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use aqar_core::{Identity, LearnedWeightProfile};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ProfileQuery {
    user_id: Option<Uuid>,
    session_id: Option<String>,
}

pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ApiResponse<LearnedWeightProfile>>, ApiError> {
    let identity = match (query.user_id, query.session_id) {
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

    let Some(row) = aqar_db::get_learned_profile(&state.pool, &identity)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            "no learned profile for this identity",
        ));
    };

    Ok(Json(ApiResponse {
        data: row.profile(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
