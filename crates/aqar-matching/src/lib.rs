//! Matching pipelines for AqarMatch.
//!
//! Glues the pure domain (`aqar-core`) to storage (`aqar-db`): records
//! interaction events with denormalized listing snapshots, runs learning
//! passes over rolling interaction windows, and computes/rescoring matches
//! between listings and buyer preferences.

pub mod cache;
pub mod error;
pub mod locks;
pub mod matcher;
pub mod recorder;
pub mod relearn;

pub use cache::TtlCache;
pub use error::MatchingError;
pub use locks::IdentityLocks;
pub use matcher::{compute_match, rescore_listing, ComputedMatch, RescoreSummary};
pub use recorder::{record_interaction, ListingCache, RecordOutcome};
pub use relearn::run_relearn;
