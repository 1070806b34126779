use crate::{
    models::{split_tags, BudgetRange, Confidence, Program, ProgramMatch, UserPreferences},
    services::{behavior::BehaviorSignals, similarity::SimilarityTables},
};

// Factor weights, in evaluation order
const COUNTRY_EXACT: u32 = 25;
const COUNTRY_REGION: u32 = 15;
const LEVEL_EXACT: u32 = 20;
const LEVEL_COMPATIBLE: u32 = 12;
const DEGREE_TYPE: u32 = 15;
const BUDGET_WITHIN: u32 = 15;
const BUDGET_UNDER_MIN: u32 = 12;
const BUDGET_SLIGHTLY_OVER: u32 = 8;
const BUDGET_OVER: u32 = 3;
const SPECIALIZATION: u32 = 10;
const PREFERRED_CITY: u32 = 8;
const DURATION: u32 = 5;
const SCHOLARSHIP_NEEDED: u32 = 7;
const SCHOLARSHIP_OFFERED: u32 = 3;
const LANGUAGE: u32 = 5;

// Behavior boosts, not counted as factors
const VIEWED_SIMILAR_BOOST: u32 = 5;
const SAVED_COUNTRY_BOOST: u32 = 3;
const SAVED_SPECIALIZATION_BOOST: u32 = 2;

/// Tuition up to this multiple of the budget maximum is "slightly over"
const SLIGHT_OVERAGE_RATIO: f64 = 1.2;

const MAX_SCORE: u32 = 100;

/// Running total for one program
#[derive(Default)]
struct Tally {
    points: u32,
    factors: u32,
    reasons: Vec<String>,
}

impl Tally {
    /// Marks a factor as evaluable for this student
    fn consider(&mut self) {
        self.factors += 1;
    }

    fn add(&mut self, points: u32, reason: String) {
        self.points += points;
        self.reasons.push(reason);
    }
}

/// Scores programs against a student's preferences and behavior
///
/// Weighted additive scoring: each factor the student expressed a preference
/// for may add points and a reason. Absent preferences skip the factor.
#[derive(Debug, Clone)]
pub struct MatchScorer {
    tables: SimilarityTables,
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(SimilarityTables::v1())
    }
}

impl MatchScorer {
    pub fn new(tables: SimilarityTables) -> Self {
        Self { tables }
    }

    /// Scores one program; never fails and never mutates its inputs
    pub fn score(
        &self,
        program: &Program,
        preferences: &UserPreferences,
        behavior: Option<&BehaviorSignals>,
    ) -> ProgramMatch {
        let mut tally = Tally::default();

        self.score_country(&mut tally, program, preferences);
        self.score_study_level(&mut tally, program, preferences);
        score_degree_type(&mut tally, program, preferences);
        score_budget(&mut tally, program, preferences);
        score_specialization(&mut tally, program, preferences);
        score_city(&mut tally, program, preferences);
        score_duration(&mut tally, program, preferences);
        score_scholarship(&mut tally, program, preferences);
        score_language(&mut tally, program, preferences);

        if let Some(signals) = behavior {
            apply_behavior_boost(&mut tally, program, signals);
        }

        let match_score = tally.points.min(MAX_SCORE) as u8;

        ProgramMatch {
            program: program.clone(),
            match_score,
            reasons: tally.reasons,
            confidence: Confidence::from_factors(tally.factors, match_score),
            category: None,
        }
    }

    fn score_country(&self, tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
        if preferences.countries.is_empty() {
            return;
        }
        tally.consider();

        if preferences.countries.contains(&program.country) {
            tally.add(
                COUNTRY_EXACT,
                format!("Located in {}, one of your preferred countries", program.country),
            );
            return;
        }

        let similar: Vec<&str> = self
            .tables
            .similar_countries(&program.country)
            .iter()
            .filter(|country| preferences.countries.contains(*country))
            .map(String::as_str)
            .collect();

        if !similar.is_empty() {
            tally.add(
                COUNTRY_REGION,
                format!(
                    "{} is in the same region as {}",
                    program.country,
                    similar.join(", ")
                ),
            );
        }
    }

    fn score_study_level(
        &self,
        tally: &mut Tally,
        program: &Program,
        preferences: &UserPreferences,
    ) {
        let Some(level) = preferences.study_level() else {
            return;
        };
        tally.consider();

        if program.study_level.trim().eq_ignore_ascii_case(level) {
            tally.add(
                LEVEL_EXACT,
                format!("Offered at your preferred {} level", program.study_level),
            );
        } else if !program.study_level.is_empty()
            && self.tables.levels_compatible(level, &program.study_level)
        {
            tally.add(
                LEVEL_COMPATIBLE,
                format!(
                    "{} level is compatible with your {} plans",
                    program.study_level, level
                ),
            );
        }
    }
}

fn score_degree_type(tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
    if preferences.degree_type.is_empty() {
        return;
    }
    tally.consider();

    if preferences.degree_type.contains(&program.degree_type) {
        tally.add(
            DEGREE_TYPE,
            format!("{} degree matches what you're looking for", program.degree_type),
        );
    }
}

fn score_budget(tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
    let (Some(BudgetRange { min, max }), Some(fee)) =
        (preferences.budget_range, program.tuition_fee)
    else {
        return;
    };
    tally.consider();

    if fee < min {
        tally.add(
            BUDGET_UNDER_MIN,
            format!(
                "Tuition is below your budget range, saving {}",
                format_amount(max - fee)
            ),
        );
    } else if fee <= max {
        tally.add(
            BUDGET_WITHIN,
            format!("Fits your budget, saving {}", format_amount(max - fee)),
        );
    } else if fee <= max * SLIGHT_OVERAGE_RATIO {
        tally.add(
            BUDGET_SLIGHTLY_OVER,
            format!("Slightly over budget by {}", format_amount(fee - max)),
        );
    } else {
        tally.add(
            BUDGET_OVER,
            format!("Over budget by {}", format_amount(fee - max)),
        );
    }
}

fn score_specialization(tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
    let wanted: Vec<String> = preferences
        .specialization
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if wanted.is_empty() {
        return;
    }
    tally.consider();

    let matched: Vec<String> = program
        .specialization_tags()
        .into_iter()
        .filter(|tag| tags_overlap(tag, &wanted))
        .collect();

    if !matched.is_empty() {
        tally.add(
            SPECIALIZATION,
            format!("Specializes in {}", matched.join(", ")),
        );
    }
}

fn score_city(tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
    if preferences.preferred_cities.is_empty() {
        return;
    }
    tally.consider();

    if preferences.preferred_cities.contains(&program.city) {
        tally.add(
            PREFERRED_CITY,
            format!("In {}, one of your preferred cities", program.city),
        );
    }
}

fn score_duration(tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
    if preferences.duration.is_empty() {
        return;
    }
    tally.consider();

    if preferences.duration.contains(&program.duration) {
        tally.add(
            DURATION,
            format!("{} duration suits your plans", program.duration),
        );
    }
}

fn score_scholarship(tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
    let Some(needed) = preferences.scholarship_needed else {
        return;
    };
    tally.consider();

    if !program.scholarship_available {
        return;
    }

    if needed {
        tally.add(
            SCHOLARSHIP_NEEDED,
            "Offers the scholarship funding you need".to_string(),
        );
    } else {
        tally.add(SCHOLARSHIP_OFFERED, "Scholarships available".to_string());
    }
}

fn score_language(tally: &mut Tally, program: &Program, preferences: &UserPreferences) {
    let Some(language) = preferences.language_preference() else {
        return;
    };
    tally.consider();

    if program
        .language_requirements
        .to_lowercase()
        .contains(&language.to_lowercase())
    {
        tally.add(LANGUAGE, format!("Taught in {}", language));
    }
}

fn apply_behavior_boost(tally: &mut Tally, program: &Program, signals: &BehaviorSignals) {
    let similar = signals.similar_viewed(program);
    if !similar.is_empty() {
        tally.add(
            VIEWED_SIMILAR_BOOST,
            format!("Similar to {} program(s) you viewed", similar.len()),
        );
    }

    if signals.country_interest.contains(&program.country) {
        tally.add(
            SAVED_COUNTRY_BOOST,
            format!("You've saved other programs in {}", program.country),
        );
    }

    let interests: Vec<String> = signals.specialization_interest.iter().cloned().collect();
    if split_tags(&program.specialization)
        .iter()
        .any(|tag| tags_overlap(tag, &interests))
    {
        tally.add(
            SAVED_SPECIALIZATION_BOOST,
            "Matches specializations you've saved".to_string(),
        );
    }
}

/// Substring overlap in either direction between a tag and any wanted token
fn tags_overlap(tag: &str, wanted: &[String]) -> bool {
    wanted
        .iter()
        .any(|w| tag.contains(w.as_str()) || w.contains(tag))
}

/// Formats an amount as a whole number with thousands separators
fn format_amount(amount: f64) -> String {
    let digits = (amount.abs().round() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}
