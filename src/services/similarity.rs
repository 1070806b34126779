//! Static lookup data used by the match scorer.
//!
//! Both tables are one-directional on purpose of the data: a country lists
//! the countries it is considered close to, and a preferred study level lists
//! the program levels it accepts. Entries are not mirrored.

use std::collections::HashMap;

/// Region clusters, keyed by a program's country (version 1)
const REGIONS_V1: &[(&str, &[&str])] = &[
    ("Canada", &["USA", "UK", "Australia", "New Zealand"]),
    ("USA", &["Canada", "UK", "Australia"]),
    ("UK", &["Ireland", "Canada", "USA", "Australia"]),
    ("Ireland", &["UK", "Canada"]),
    ("Australia", &["New Zealand", "Canada", "UK"]),
    ("New Zealand", &["Australia", "Canada"]),
    ("Germany", &["Netherlands", "Austria", "Switzerland", "Denmark"]),
    ("Netherlands", &["Germany", "Belgium", "Denmark"]),
    ("Belgium", &["Netherlands", "France", "Germany"]),
    ("France", &["Belgium", "Switzerland", "Canada"]),
    ("Switzerland", &["Germany", "Austria", "France"]),
    ("Austria", &["Germany", "Switzerland"]),
    ("Denmark", &["Sweden", "Norway", "Finland", "Netherlands"]),
    ("Sweden", &["Denmark", "Norway", "Finland"]),
    ("Norway", &["Sweden", "Denmark", "Finland"]),
    ("Finland", &["Sweden", "Norway", "Denmark"]),
    ("Japan", &["South Korea", "Taiwan", "Singapore"]),
    ("South Korea", &["Japan", "Taiwan"]),
    ("Singapore", &["Malaysia", "Hong Kong", "Japan"]),
    ("Malaysia", &["Singapore", "Thailand"]),
    ("China", &["Hong Kong", "Taiwan", "Singapore"]),
];

/// Study level compatibility, keyed by the preferred level (version 1)
const STUDY_LEVELS_V1: &[(&str, &[&str])] = &[
    ("bachelor", &["undergraduate", "bachelors", "bsc", "ba"]),
    ("master", &["graduate", "postgraduate", "masters"]),
    ("phd", &["doctorate", "doctoral", "postgraduate"]),
    ("diploma", &["certificate", "associate", "foundation"]),
];

/// Lookup tables consulted by [`MatchScorer`](super::scorer::MatchScorer)
#[derive(Debug, Clone, Default)]
pub struct SimilarityTables {
    regions: HashMap<String, Vec<String>>,
    study_levels: HashMap<String, Vec<String>>,
}

impl SimilarityTables {
    /// Builds tables from explicit entries
    ///
    /// Study level keys are matched case-insensitively; region keys are
    /// matched exactly, like country names elsewhere.
    pub fn new(regions: &[(&str, &[&str])], study_levels: &[(&str, &[&str])]) -> Self {
        Self {
            regions: regions
                .iter()
                .map(|(country, similar)| {
                    (country.to_string(), similar.iter().map(|c| c.to_string()).collect())
                })
                .collect(),
            study_levels: study_levels
                .iter()
                .map(|(level, compatible)| {
                    (
                        level.to_lowercase(),
                        compatible.iter().map(|l| l.to_lowercase()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// The tables shipped with the service
    pub fn v1() -> Self {
        Self::new(REGIONS_V1, STUDY_LEVELS_V1)
    }

    /// Countries considered close to `country`
    pub fn similar_countries(&self, country: &str) -> &[String] {
        self.regions
            .get(country)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a program at `program_level` is acceptable for a student who
    /// asked for `preferred_level`
    pub fn levels_compatible(&self, preferred_level: &str, program_level: &str) -> bool {
        let program_level = program_level.to_lowercase();
        self.study_levels
            .get(&preferred_level.to_lowercase())
            .is_some_and(|compatible| compatible.iter().any(|level| program_level.contains(level)))
    }
}
