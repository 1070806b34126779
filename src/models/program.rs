use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lenient_number;

/// A study-abroad program as published in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: Uuid,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub degree_type: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    /// Tuition as a single comparable number; absent when the catalog value
    /// is missing or not numeric
    #[serde(default, deserialize_with = "lenient_number")]
    pub tuition_fee: Option<f64>,
    /// Free-text, comma-separated specialization tags
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub study_level: String,
    #[serde(default)]
    pub language_requirements: String,
    #[serde(default)]
    pub scholarship_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Program {
    /// Lower-cased, trimmed specialization tags
    pub fn specialization_tags(&self) -> Vec<String> {
        split_tags(&self.specialization)
    }
}

/// Splits a comma-separated tag list into normalized tokens
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}
