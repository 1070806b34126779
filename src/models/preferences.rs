use serde::{Deserialize, Deserializer, Serialize};

/// Inclusive tuition range the student is willing to pay
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawBudget")]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

impl BudgetRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Budget with only an upper bound
    pub fn up_to(max: f64) -> Self {
        Self { min: 0.0, max }
    }
}

/// Accepted wire shapes for a budget: a plain maximum, a `[min, max]` pair,
/// or an object with `min`/`max` keys
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBudget {
    Max(f64),
    Pair([f64; 2]),
    Range {
        #[serde(default)]
        min: Option<f64>,
        max: f64,
    },
}

impl TryFrom<RawBudget> for BudgetRange {
    type Error = String;

    fn try_from(raw: RawBudget) -> Result<Self, Self::Error> {
        let (min, max) = match raw {
            RawBudget::Max(max) => (0.0, max),
            RawBudget::Pair([min, max]) => (min, max),
            RawBudget::Range { min, max } => (min.unwrap_or(0.0), max),
        };

        if !min.is_finite() || !max.is_finite() {
            return Err("budget bounds must be finite numbers".to_string());
        }
        if min < 0.0 || min > max {
            return Err(format!("invalid budget range [{}, {}]", min, max));
        }

        Ok(BudgetRange { min, max })
    }
}

/// Deserializes a budget, treating malformed values as "no budget given"
fn lenient_budget<'de, D>(deserializer: D) -> Result<Option<BudgetRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// A student's stated preferences
///
/// Every field is optional: empty sets and `None` mean the student did not
/// express a preference, and the corresponding scoring factor is skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    #[serde(default, deserialize_with = "lenient_budget")]
    pub budget_range: Option<BudgetRange>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub degree_type: Vec<String>,
    #[serde(default)]
    pub specialization: Vec<String>,
    #[serde(default)]
    pub duration: Vec<String>,
    #[serde(default)]
    pub study_level: Option<String>,
    #[serde(default)]
    pub language_preference: Option<String>,
    #[serde(default)]
    pub scholarship_needed: Option<bool>,
    #[serde(default)]
    pub preferred_cities: Vec<String>,
    /// Free text, not used for scoring
    #[serde(default)]
    pub goals: Option<String>,
}

impl UserPreferences {
    /// Study level if one was actually given
    pub fn study_level(&self) -> Option<&str> {
        non_blank(self.study_level.as_deref())
    }

    /// Language preference if one was actually given
    pub fn language_preference(&self) -> Option<&str> {
        non_blank(self.language_preference.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
