//! Static per-city district adjacency data.
//!
//! Loaded once at startup from a YAML file mapping
//! `city -> district -> [neighboring districts]`. The source data is not
//! guaranteed symmetric — district A may list B without B listing A — so
//! [`AdjacencyGraph::are_adjacent`] checks both directions.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

#[derive(Debug, Deserialize)]
struct DistrictsFile {
    cities: HashMap<String, HashMap<String, Vec<String>>>,
}

/// In-memory district adjacency map for all supported cities.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    cities: HashMap<String, HashMap<String, Vec<String>>>,
}

static NO_NEIGHBORS: &[String] = &[];

impl AdjacencyGraph {
    /// Build a graph directly from city/district data. Used by tests and
    /// by callers that source adjacency from somewhere other than YAML.
    #[must_use]
    pub fn from_map(cities: HashMap<String, HashMap<String, Vec<String>>>) -> Self {
        Self { cities }
    }

    /// Load and validate the adjacency data from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails
    /// validation (empty names, self-adjacency).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::DistrictsFileIo {
            path: path.display().to_string(),
            source: e,
        })?;

        let file: DistrictsFile = serde_yaml::from_str(&content)?;
        validate(&file)?;

        Ok(Self {
            cities: file.cities,
        })
    }

    /// Districts listed as neighbors of `district` in `city`.
    ///
    /// Unknown city or district returns the empty slice. This is the raw,
    /// one-directional view; use [`Self::are_adjacent`] for scoring.
    #[must_use]
    pub fn neighbors(&self, city: &str, district: &str) -> &[String] {
        self.cities
            .get(city)
            .and_then(|districts| districts.get(district))
            .map_or(NO_NEIGHBORS, Vec::as_slice)
    }

    /// Whether two districts are adjacent in `city`, in either direction.
    #[must_use]
    pub fn are_adjacent(&self, city: &str, a: &str, b: &str) -> bool {
        self.neighbors(city, a).iter().any(|n| n == b)
            || self.neighbors(city, b).iter().any(|n| n == a)
    }

    /// Number of supported cities.
    #[must_use]
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// Total number of districts across all cities.
    #[must_use]
    pub fn district_count(&self) -> usize {
        self.cities.values().map(HashMap::len).sum()
    }

    /// Iterate over supported city names.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.cities.keys().map(String::as_str)
    }
}

fn validate(file: &DistrictsFile) -> Result<(), ConfigError> {
    for (city, districts) in &file.cities {
        if city.trim().is_empty() {
            return Err(ConfigError::Validation(
                "city name must be non-empty".to_string(),
            ));
        }

        for (district, neighbors) in districts {
            if district.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "city '{city}' contains an empty district name"
                )));
            }

            for neighbor in neighbors {
                if neighbor.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "district '{district}' in '{city}' lists an empty neighbor"
                    )));
                }
                if neighbor == district {
                    return Err(ConfigError::Validation(format!(
                        "district '{district}' in '{city}' lists itself as a neighbor"
                    )));
                }
            }
        }
    }

    Ok(())
}
