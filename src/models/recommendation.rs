use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::Program;

/// Qualitative reliability of a match score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Derives confidence from how many factors were evaluable and the score
    pub fn from_factors(factors: u32, score: u8) -> Self {
        if factors >= 4 && score >= 70 {
            Confidence::High
        } else if factors >= 2 && score >= 50 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Recommendation buckets, in display priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryId {
    PerfectMatch,
    BudgetFriendly,
    RisingStars,
    AiSuggested,
    HiddenGems,
    General,
}

impl Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            CategoryId::PerfectMatch => "perfect-match",
            CategoryId::BudgetFriendly => "budget-friendly",
            CategoryId::RisingStars => "rising-stars",
            CategoryId::AiSuggested => "ai-suggested",
            CategoryId::HiddenGems => "hidden-gems",
            CategoryId::General => "general",
        };
        write!(f, "{}", id)
    }
}

/// A program scored against one student's preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramMatch {
    pub program: Program,
    /// 0–100
    pub match_score: u8,
    /// Human-readable explanations, in factor evaluation order
    pub reasons: Vec<String>,
    pub confidence: Confidence,
    /// Assigned when the match is placed into a category
    pub category: Option<CategoryId>,
}

/// A titled group of matches shown together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCategory {
    pub id: CategoryId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub programs: Vec<ProgramMatch>,
    /// Rounded mean score of `programs`
    pub match_percentage: u8,
    pub reason: String,
}
