use serde::{Deserialize, Deserializer};

mod behavior;
mod preferences;
mod program;
mod recommendation;

pub use behavior::{Interaction, InteractionKind, UserBehavior};
pub use preferences::{BudgetRange, UserPreferences};
pub use program::{split_tags, Program};
pub use recommendation::{CategoryId, Confidence, ProgramMatch, RecommendationCategory};

/// Deserializes an optional number that upstream stores may send as a JSON
/// number, a numeric string, or something unusable
///
/// Anything that does not parse to a finite number becomes `None`.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;

    let number = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };

    Ok(number.filter(|n| n.is_finite()))
}
