//! Core domain logic for AqarMatch.
//!
//! Pure matching and learning primitives: the typed data model, the
//! district adjacency graph, the 100-point match scorer, the preference
//! weight learner, and the confidence-gated score blender. No database or
//! network I/O lives here; the only filesystem access is loading the
//! district adjacency YAML and reading env vars for configuration.

use thiserror::Error;

pub mod adjacency;
pub mod app_config;
pub mod blender;
pub mod config;
pub mod learner;
pub mod numeric;
pub mod scorer;
pub mod types;

pub use adjacency::AdjacencyGraph;
pub use app_config::{AppConfig, Environment};
pub use blender::blend;
pub use config::{load_app_config, load_app_config_from_env};
pub use learner::relearn;
pub use scorer::score;
pub use types::{
    Identity, InteractionKind, InteractionSample, InvalidPreference, LearnedWeightProfile,
    LearnedWeights, ListingSnapshot, MatchBreakdown, MatchScore, PreferenceProfile, PropertyType,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read districts file {path}: {source}")]
    DistrictsFileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse districts file: {0}")]
    DistrictsFileParse(#[from] serde_yaml::Error),
    #[error("{0}")]
    Validation(String),
}
