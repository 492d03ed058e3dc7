//! Typed data model shared across the workspace.
//!
//! The upstream intake system ships listings and preferences as loose JSON;
//! everything here is the explicit typed form those payloads normalize into
//! before any scoring or learning happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    Villa,
    Duplex,
    Townhouse,
    Studio,
    Land,
    Office,
    Shop,
}

impl PropertyType {
    /// Fixed similarity table used for partial property-type credit.
    ///
    /// Symmetric: villa↔duplex, villa↔townhouse, apartment↔studio.
    #[must_use]
    pub fn is_similar_to(self, other: PropertyType) -> bool {
        use PropertyType::{Apartment, Duplex, Studio, Townhouse, Villa};
        matches!(
            (self, other),
            (Villa, Duplex | Townhouse)
                | (Duplex | Townhouse, Villa)
                | (Apartment, Studio)
                | (Studio, Apartment)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::Villa => "villa",
            PropertyType::Duplex => "duplex",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Studio => "studio",
            PropertyType::Land => "land",
            PropertyType::Office => "office",
            PropertyType::Shop => "shop",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apartment" => Ok(PropertyType::Apartment),
            "villa" => Ok(PropertyType::Villa),
            "duplex" => Ok(PropertyType::Duplex),
            "townhouse" => Ok(PropertyType::Townhouse),
            "studio" => Ok(PropertyType::Studio),
            "land" => Ok(PropertyType::Land),
            "office" => Ok(PropertyType::Office),
            "shop" => Ok(PropertyType::Shop),
            other => Err(format!("unknown property type: {other}")),
        }
    }
}

/// A discrete user action against a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Save,
    Skip,
    Contact,
    Share,
    Unsave,
}

impl InteractionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Save => "save",
            InteractionKind::Skip => "skip",
            InteractionKind::Contact => "contact",
            InteractionKind::Share => "share",
            InteractionKind::Unsave => "unsave",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionKind::View),
            "save" => Ok(InteractionKind::Save),
            "skip" => Ok(InteractionKind::Skip),
            "contact" => Ok(InteractionKind::Contact),
            "share" => Ok(InteractionKind::Share),
            "unsave" => Ok(InteractionKind::Unsave),
            other => Err(format!("unknown interaction kind: {other}")),
        }
    }
}

/// The actor behind interactions: a registered user or an anonymous session.
///
/// Exactly one of the two; the storage layer enforces the same exclusivity
/// with a CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    User(Uuid),
    Session(String),
}

impl Identity {
    /// Canonical storage key, used both as the learned-profile primary key
    /// and as the per-identity lock key.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Identity::User(id) => format!("user:{id}"),
            Identity::Session(id) => format!("session:{id}"),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Matching attributes of a listing, captured immutably.
///
/// Interaction events carry a copy of these fields taken at record time so
/// later learning passes never depend on the listing's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub city: String,
    pub district: String,
    /// Whole SAR.
    pub price: i64,
    pub property_type: PropertyType,
    pub rooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub is_active: bool,
}

/// A buyer's stated search criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub city: String,
    /// Ordered, deduplicated; empty means "any district in the city".
    pub districts: Vec<String>,
    pub property_type: PropertyType,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub rooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Error)]
#[error("invalid preference: {0}")]
pub struct InvalidPreference(pub String);

impl PreferenceProfile {
    /// Reject preferences that cannot be scored.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPreference`] when the city is empty or the budget
    /// bounds are inverted. The property type is required by construction.
    pub fn validate(&self) -> Result<(), InvalidPreference> {
        if self.city.trim().is_empty() {
            return Err(InvalidPreference("city is required".to_string()));
        }
        if let (Some(min), Some(max)) = (self.budget_min, self.budget_max) {
            if min > max {
                return Err(InvalidPreference(format!(
                    "budget_min {min} exceeds budget_max {max}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-criterion sub-scores behind a match total.
///
/// `None` marks a criterion that was not evaluated: rooms/area when either
/// side is missing, price when the preference states no budget ceiling
/// (the flat credit still counts toward the total). The blender only
/// reweights criteria that were actually evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub location: f64,
    pub price: Option<f64>,
    pub property_type: f64,
    pub rooms: Option<f64>,
    pub area: Option<f64>,
}

impl MatchBreakdown {
    /// Combined specs sub-score (property type + rooms + area).
    #[must_use]
    pub fn specs(&self) -> f64 {
        self.property_type + self.rooms.unwrap_or(0.0) + self.area.unwrap_or(0.0)
    }
}

/// Result of scoring one listing against one preference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Total in [0, 100].
    pub total: u8,
    pub breakdown: MatchBreakdown,
}

/// Scalar per-criterion weights, each clamped to [0.3, 2.0].
///
/// `age` is reserved for a future recency criterion and is carried but
/// never updated by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearnedWeights {
    pub location: f64,
    pub price: f64,
    pub area: f64,
    pub property_type: f64,
    pub age: f64,
}

impl Default for LearnedWeights {
    fn default() -> Self {
        Self {
            location: 1.0,
            price: 1.0,
            area: 1.0,
            property_type: 1.0,
            age: 1.0,
        }
    }
}

/// Per-identity output of the preference weight learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedWeightProfile {
    pub weights: LearnedWeights,
    /// Top districts by interaction tally, at most 5.
    pub preferred_districts: Vec<String>,
    /// Top property types by interaction tally, at most 3.
    pub preferred_property_types: Vec<PropertyType>,
    pub price_range_min: Option<i64>,
    pub price_range_max: Option<i64>,
    /// In [0, 1]; below the gate the blender passes base scores through.
    pub confidence: f64,
    /// Interactions in the window used by the latest pass, not cumulative.
    pub total_interactions: i32,
    pub last_updated_at: DateTime<Utc>,
}

impl LearnedWeightProfile {
    /// Starting point for an identity with no learned state.
    #[must_use]
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            weights: LearnedWeights::default(),
            preferred_districts: Vec::new(),
            preferred_property_types: Vec::new(),
            price_range_min: None,
            price_range_max: None,
            confidence: 0.0,
            total_interactions: 0,
            last_updated_at: now,
        }
    }
}

/// One interaction as the learner sees it: the action plus the snapshot
/// attributes that were present on the listing at record time.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSample {
    pub kind: InteractionKind,
    pub duration_secs: Option<i32>,
    pub district: Option<String>,
    pub price: Option<i64>,
    pub area_sqm: Option<i32>,
    pub property_type: Option<PropertyType>,
    pub occurred_at: DateTime<Utc>,
}
