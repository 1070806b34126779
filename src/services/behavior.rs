use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    models::{split_tags, Program, UserBehavior},
    services::providers::CatalogSource,
};

/// Attributes of a viewed program that similarity is judged on
#[derive(Debug, Clone, PartialEq)]
struct ViewedProgram {
    id: Uuid,
    country: String,
    degree_type: String,
}

impl From<&Program> for ViewedProgram {
    fn from(program: &Program) -> Self {
        Self {
            id: program.id,
            country: program.country.clone(),
            degree_type: program.degree_type.clone(),
        }
    }
}

/// Behavior-derived signals for one recommendation run
///
/// Captured once per request so that scoring itself stays synchronous.
#[derive(Debug, Clone, Default)]
pub struct BehaviorSignals {
    viewed: Vec<ViewedProgram>,
    /// Countries of saved programs
    pub country_interest: BTreeSet<String>,
    /// Specialization tags of saved programs
    pub specialization_interest: BTreeSet<String>,
}

impl BehaviorSignals {
    pub(crate) fn new(
        viewed: &[Program],
        country_interest: BTreeSet<String>,
        specialization_interest: BTreeSet<String>,
    ) -> Self {
        Self {
            viewed: viewed.iter().map(ViewedProgram::from).collect(),
            country_interest,
            specialization_interest,
        }
    }

    /// Viewed programs sharing a country or degree type with `program`
    pub fn similar_viewed(&self, program: &Program) -> Vec<Uuid> {
        similar_in(program, &self.viewed)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.viewed.is_empty()
            && self.country_interest.is_empty()
            && self.specialization_interest.is_empty()
    }
}

fn shares_attribute(a: &str, b: &str) -> bool {
    !a.is_empty() && a == b
}

fn similar_in(program: &Program, viewed: &[ViewedProgram]) -> Vec<Uuid> {
    viewed
        .iter()
        .filter(|v| {
            shares_attribute(&v.country, &program.country)
                || shares_attribute(&v.degree_type, &program.degree_type)
        })
        .map(|v| v.id)
        .collect()
}

/// Derives secondary signals from a user's interaction history
///
/// Every lookup is best-effort: catalog failures are logged and read as
/// "no signal", never as an error.
#[derive(Clone)]
pub struct BehaviorAggregator {
    catalog: Arc<dyn CatalogSource>,
}

impl BehaviorAggregator {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }

    /// Viewed program ids sharing a country or degree type with `program_id`
    pub async fn find_similar_programs(&self, program_id: Uuid, viewed_ids: &[Uuid]) -> Vec<Uuid> {
        if viewed_ids.is_empty() {
            return Vec::new();
        }

        let candidate = [program_id];
        let (candidate, viewed) = tokio::join!(self.lookup(&candidate), self.lookup(viewed_ids));

        let Some(candidate) = candidate.first() else {
            return Vec::new();
        };
        let viewed: Vec<ViewedProgram> = viewed.iter().map(ViewedProgram::from).collect();

        similar_in(candidate, &viewed)
    }

    /// Distinct countries among saved programs
    pub async fn get_country_interest(&self, saved_ids: &[Uuid]) -> BTreeSet<String> {
        self.lookup(saved_ids)
            .await
            .into_iter()
            .map(|p| p.country)
            .filter(|country| !country.is_empty())
            .collect()
    }

    /// Distinct specialization tags among saved programs
    pub async fn get_specialization_interest(&self, saved_ids: &[Uuid]) -> BTreeSet<String> {
        self.lookup(saved_ids)
            .await
            .iter()
            .flat_map(|p| split_tags(&p.specialization))
            .collect()
    }

    /// Resolves every signal the scorer needs for one user
    ///
    /// The three catalog queries are independent and run concurrently.
    pub async fn load_signals(&self, behavior: &UserBehavior) -> BehaviorSignals {
        if behavior.viewed_programs.is_empty() && behavior.saved_programs.is_empty() {
            return BehaviorSignals::default();
        }

        let (viewed, country_interest, specialization_interest) = tokio::join!(
            self.lookup(&behavior.viewed_programs),
            self.get_country_interest(&behavior.saved_programs),
            self.get_specialization_interest(&behavior.saved_programs),
        );

        let signals = BehaviorSignals::new(&viewed, country_interest, specialization_interest);

        tracing::debug!(
            viewed = signals.viewed.len(),
            countries = signals.country_interest.len(),
            specializations = signals.specialization_interest.len(),
            "Behavior signals loaded"
        );

        signals
    }

    async fn lookup(&self, ids: &[Uuid]) -> Vec<Program> {
        if ids.is_empty() {
            return Vec::new();
        }

        match self.catalog.fetch_programs(ids).await {
            Ok(mut programs) => {
                // Keep the caller's id order regardless of backend ordering
                programs.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
                programs
            }
            Err(e) => {
                tracing::warn!(
                    source = self.catalog.name(),
                    id_count = ids.len(),
                    error = %e,
                    "Behavior lookup failed, ignoring signal"
                );
                Vec::new()
            }
        }
    }
}
