//! Error types for the matching pipelines.

use thiserror::Error;

use aqar_core::InvalidPreference;
use aqar_db::DbError;

#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("listing {0} not found")]
    ListingNotFound(i64),

    #[error("preference {0} not found")]
    PreferenceNotFound(i64),

    #[error(transparent)]
    InvalidPreference(#[from] InvalidPreference),

    #[error("database error: {0}")]
    Db(#[from] DbError),
}
