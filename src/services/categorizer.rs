use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{
    BudgetRange, CategoryId, Confidence, ProgramMatch, RecommendationCategory,
};

/// Static presentation data for one category
struct CategorySpec {
    id: CategoryId,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    /// Maximum number of programs displayed
    cap: usize,
    reason: &'static str,
}

/// Categories in claim order; a program lands in the first one that admits it
const PRIORITIZED: [CategorySpec; 5] = [
    CategorySpec {
        id: CategoryId::PerfectMatch,
        title: "Perfect Matches",
        description: "Programs that fit nearly everything you asked for",
        icon: "target",
        cap: 6,
        reason: "These programs match your key preferences",
    },
    CategorySpec {
        id: CategoryId::BudgetFriendly,
        title: "Budget-Friendly",
        description: "Strong matches that fit your budget",
        icon: "wallet",
        cap: 4,
        reason: "High match scores at a price within your budget",
    },
    CategorySpec {
        id: CategoryId::RisingStars,
        title: "Rising Stars",
        description: "Strong matches with scholarship opportunities",
        icon: "star",
        cap: 4,
        reason: "Strong fit with scholarships available to lower your costs",
    },
    CategorySpec {
        id: CategoryId::AiSuggested,
        title: "AI Suggested",
        description: "Good matches based on your profile and activity",
        icon: "sparkles",
        cap: 4,
        reason: "Good overall fit with your preferences and browsing history",
    },
    CategorySpec {
        id: CategoryId::HiddenGems,
        title: "Hidden Gems",
        description: "Programs you might not have considered",
        icon: "gem",
        cap: 3,
        reason: "Partial matches that could broaden your options",
    },
];

/// Shown only when no prioritized category has members
const GENERAL: CategorySpec = CategorySpec {
    id: CategoryId::General,
    title: "Explore Programs",
    description: "Programs from across the catalog",
    icon: "compass",
    cap: 8,
    reason: "Add more preferences to get sharper recommendations",
};

/// Groups scored programs into prioritized, mutually exclusive categories
#[derive(Debug, Clone, Default)]
pub struct Categorizer {
    budget: Option<BudgetRange>,
}

impl Categorizer {
    /// `budget` is the student's budget, consulted by the budget-friendly bucket
    pub fn new(budget: Option<BudgetRange>) -> Self {
        Self { budget }
    }

    /// Sorts, buckets and truncates `matches`
    ///
    /// A program placed in a category is not offered to lower-priority ones.
    /// Programs that overflow a category's display cap stay available.
    pub fn categorize(&self, mut matches: Vec<ProgramMatch>) -> Vec<RecommendationCategory> {
        if matches.is_empty() {
            return Vec::new();
        }

        sort_matches(&mut matches);

        let mut claimed: HashSet<Uuid> = HashSet::new();
        let mut categories = Vec::new();

        for spec in &PRIORITIZED {
            let members: Vec<ProgramMatch> = matches
                .iter()
                .filter(|m| !claimed.contains(&m.program.id) && self.admits(spec.id, m))
                .take(spec.cap)
                .cloned()
                .collect();

            if members.is_empty() {
                continue;
            }

            claimed.extend(members.iter().map(|m| m.program.id));
            categories.push(build_category(spec, members));
        }

        if categories.is_empty() {
            let members = matches.into_iter().take(GENERAL.cap).collect();
            categories.push(build_category(&GENERAL, members));
        }

        categories
    }

    fn admits(&self, id: CategoryId, m: &ProgramMatch) -> bool {
        let score = m.match_score;
        match id {
            CategoryId::PerfectMatch => score >= 90 && m.confidence == Confidence::High,
            CategoryId::BudgetFriendly => score >= 80 && self.within_budget(m),
            CategoryId::RisingStars => score >= 75 && m.program.scholarship_available,
            CategoryId::AiSuggested => score >= 70,
            CategoryId::HiddenGems => (60..70).contains(&score),
            CategoryId::General => true,
        }
    }

    /// Without a budget every program counts as affordable; with one, the
    /// tuition must be known and at most the budget maximum
    fn within_budget(&self, m: &ProgramMatch) -> bool {
        match self.budget {
            Some(budget) => m.program.tuition_fee.is_some_and(|fee| fee <= budget.max),
            None => true,
        }
    }
}

/// Highest score first; ties go to the newer program, then the lower id
fn sort_matches(matches: &mut [ProgramMatch]) {
    matches.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| b.program.created_at.cmp(&a.program.created_at))
            .then_with(|| a.program.id.cmp(&b.program.id))
    });
}

fn build_category(spec: &CategorySpec, mut members: Vec<ProgramMatch>) -> RecommendationCategory {
    for member in &mut members {
        member.category = Some(spec.id);
    }

    let reason = match spec.id {
        CategoryId::PerfectMatch => members
            .first()
            .filter(|top| !top.reasons.is_empty())
            .map(|top| top.reasons.iter().take(2).cloned().collect::<Vec<_>>().join("; "))
            .unwrap_or_else(|| spec.reason.to_string()),
        _ => spec.reason.to_string(),
    };

    RecommendationCategory {
        id: spec.id,
        title: spec.title.to_string(),
        description: spec.description.to_string(),
        icon: spec.icon.to_string(),
        match_percentage: mean_score(&members),
        programs: members,
        reason,
    }
}

fn mean_score(members: &[ProgramMatch]) -> u8 {
    if members.is_empty() {
        return 0;
    }
    let total: u32 = members.iter().map(|m| m.match_score as u32).sum();
    (total as f64 / members.len() as f64).round() as u8
}
