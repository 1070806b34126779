use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Interaction, InteractionKind, ProgramMatch, RecommendationCategory, UserBehavior,
        UserPreferences,
    },
    services::{
        behavior::{BehaviorAggregator, BehaviorSignals},
        categorizer::Categorizer,
        providers::{CatalogSource, UserDataSource},
        scorer::MatchScorer,
    },
};

/// Why a recommendation run was started; only affects logging
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Initial,
    Refresh,
}

/// Generates categorized program recommendations
///
/// Fetches the catalog and (for a known user) their behavior, scores every
/// program and groups the results. Only a catalog failure fails the call;
/// user data lookups degrade to "nothing known".
#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<dyn CatalogSource>,
    users: Arc<dyn UserDataSource>,
    behavior: BehaviorAggregator,
    scorer: MatchScorer,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<dyn CatalogSource>, users: Arc<dyn UserDataSource>) -> Self {
        Self {
            behavior: BehaviorAggregator::new(catalog.clone()),
            catalog,
            users,
            scorer: MatchScorer::default(),
        }
    }

    /// Replaces the default scorer, e.g. to use different similarity tables
    pub fn with_scorer(mut self, scorer: MatchScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Recommendations for `preferences`, boosted by `user_id`'s behavior
    pub async fn get_recommendations(
        &self,
        preferences: &UserPreferences,
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<RecommendationCategory>> {
        self.run(preferences, user_id, Trigger::Initial).await
    }

    /// User-requested recompute; same pipeline as [`Self::get_recommendations`]
    pub async fn refresh(
        &self,
        preferences: &UserPreferences,
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<RecommendationCategory>> {
        self.run(preferences, user_id, Trigger::Refresh).await
    }

    /// Stored preferences for a user, or empty preferences when none are
    /// stored or the store is unavailable
    pub async fn preferences_for(&self, user_id: Uuid) -> UserPreferences {
        match self.users.fetch_user_preferences(user_id).await {
            Ok(Some(preferences)) => preferences,
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "No stored preferences");
                UserPreferences::default()
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Preference lookup failed, using empty preferences"
                );
                UserPreferences::default()
            }
        }
    }

    /// Behavior derived from the user's interaction log; empty on failure
    pub async fn fetch_user_behavior(&self, user_id: Uuid) -> UserBehavior {
        match self.users.fetch_interactions(user_id).await {
            Ok(interactions) => {
                let behavior = UserBehavior::from_interactions(&interactions);
                if behavior.is_empty() {
                    tracing::debug!(user_id = %user_id, "No recorded interactions");
                }
                behavior
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Interaction log unavailable, continuing without behavior"
                );
                UserBehavior::default()
            }
        }
    }

    /// Appends an interaction to the user's log
    ///
    /// Program interactions must name a program present in the catalog.
    pub async fn record_interaction(&self, interaction: Interaction) -> AppResult<()> {
        match (interaction.kind, interaction.program_id) {
            (InteractionKind::Searched, _) => {
                if interaction.query.as_deref().map_or(true, |q| q.trim().is_empty()) {
                    return Err(AppError::InvalidInput(
                        "Search interactions require a query".to_string(),
                    ));
                }
            }
            (kind, None) => {
                return Err(AppError::InvalidInput(format!(
                    "{} interactions require a program_id",
                    kind.as_str()
                )));
            }
            (_, Some(program_id)) => {
                let found = self.catalog.fetch_programs(&[program_id]).await?;
                if !found.iter().any(|p| p.id == program_id) {
                    return Err(AppError::NotFound(format!(
                        "Program {} not found",
                        program_id
                    )));
                }
            }
        }

        self.users.record_interaction(interaction).await
    }

    async fn run(
        &self,
        preferences: &UserPreferences,
        user_id: Option<Uuid>,
        trigger: Trigger,
    ) -> AppResult<Vec<RecommendationCategory>> {
        let start = Instant::now();

        let (catalog, signals) = tokio::join!(self.catalog.fetch_catalog(), self.load_signals(user_id));

        let catalog = catalog.map_err(|e| {
            tracing::error!(
                source = self.catalog.name(),
                error = %e,
                "Catalog fetch failed"
            );
            e
        })?;

        let matches: Vec<ProgramMatch> = catalog
            .iter()
            .map(|program| self.scorer.score(program, preferences, signals.as_ref()))
            .collect();

        let categories = Categorizer::new(preferences.budget_range).categorize(matches);

        tracing::info!(
            trigger = ?trigger,
            user_id = ?user_id,
            program_count = catalog.len(),
            category_count = categories.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations generated"
        );

        Ok(categories)
    }

    async fn load_signals(&self, user_id: Option<Uuid>) -> Option<BehaviorSignals> {
        let user_id = user_id?;
        let behavior = self.fetch_user_behavior(user_id).await;
        let signals = self.behavior.load_signals(&behavior).await;
        (!signals.is_empty()).then_some(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetRange, CategoryId, Confidence, Program};
    use crate::services::similarity::SimilarityTables;
    use crate::services::providers::{MemorySource, MockCatalogSource, MockUserDataSource};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    const USER: Uuid = Uuid::from_u128(1000);

    fn program(id: u128, country: &str, tuition: f64, scholarship: bool) -> Program {
        Program {
            id: Uuid::from_u128(id),
            university: format!("University {}", id),
            name: format!("Program {}", id),
            degree_type: "Master".to_string(),
            country: country.to_string(),
            city: "Capital".to_string(),
            tuition_fee: Some(tuition),
            specialization: "Computer Science".to_string(),
            duration: "2 years".to_string(),
            study_level: "Master".to_string(),
            language_requirements: "English".to_string(),
            scholarship_available: scholarship,
            created_at: Utc.with_ymd_and_hms(2024, 1, id as u32 % 28 + 1, 0, 0, 0).unwrap(),
        }
    }

    fn catalog() -> Vec<Program> {
        vec![
            program(1, "Canada", 8_000_000.0, true),
            program(2, "Canada", 20_000_000.0, false),
            program(3, "USA", 9_000_000.0, true),
            program(4, "Germany", 4_000_000.0, false),
            program(5, "Japan", 7_000_000.0, false),
            program(6, "Netherlands", 6_000_000.0, true),
        ]
    }

    fn preferences() -> UserPreferences {
        UserPreferences {
            countries: vec!["Canada".to_string(), "Germany".to_string()],
            degree_type: vec!["Master".to_string()],
            study_level: Some("master".to_string()),
            budget_range: Some(BudgetRange::new(5_000_000.0, 10_000_000.0)),
            specialization: vec!["computer science".to_string()],
            scholarship_needed: Some(true),
            ..Default::default()
        }
    }

    fn engine_with(users: Arc<dyn UserDataSource>) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(MemorySource::new(catalog())), users)
    }

    fn memory_engine() -> (RecommendationEngine, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::new(catalog()));
        let engine = RecommendationEngine::new(source.clone(), source.clone());
        (engine, source)
    }

    #[tokio::test]
    async fn test_categories_are_mutually_exclusive() {
        let (engine, _) = memory_engine();
        let categories = engine.get_recommendations(&preferences(), None).await.unwrap();

        assert!(!categories.is_empty());
        let mut seen = HashSet::new();
        for category in &categories {
            for m in &category.programs {
                assert!(seen.insert(m.program.id), "{} listed twice", m.program.id);
                assert!(m.match_score <= 100);
            }
        }
    }

    #[tokio::test]
    async fn test_exact_match_ranks_first() {
        let (engine, _) = memory_engine();
        let categories = engine.get_recommendations(&preferences(), None).await.unwrap();

        let top = &categories[0];
        assert_eq!(top.id, CategoryId::PerfectMatch);
        assert_eq!(top.programs[0].program.id, Uuid::from_u128(1));
        assert_eq!(top.programs[0].confidence, Confidence::High);
    }

    #[tokio::test]
    async fn test_budget_shortfall_not_budget_friendly() {
        let (engine, _) = memory_engine();
        let categories = engine.get_recommendations(&preferences(), None).await.unwrap();

        let budget_friendly = categories
            .iter()
            .find(|c| c.id == CategoryId::BudgetFriendly)
            .map(|c| c.programs.clone())
            .unwrap_or_default();
        assert!(budget_friendly
            .iter()
            .all(|m| m.program.id != Uuid::from_u128(2)));
    }

    #[tokio::test]
    async fn test_empty_catalog_returns_no_categories() {
        let source = Arc::new(MemorySource::default());
        let engine = RecommendationEngine::new(source.clone(), source);
        let categories = engine.get_recommendations(&preferences(), None).await.unwrap();
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn test_no_preferences_single_general_category() {
        let (engine, _) = memory_engine();
        let categories = engine
            .get_recommendations(&UserPreferences::default(), None)
            .await
            .unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, CategoryId::General);
        assert_eq!(categories[0].programs.len(), catalog().len());
        assert_eq!(categories[0].match_percentage, 0);
        for m in &categories[0].programs {
            assert_eq!(m.match_score, 0);
            assert_eq!(m.confidence, Confidence::Low);
            assert_eq!(m.category, Some(CategoryId::General));
        }
    }

    #[tokio::test]
    async fn test_catalog_failure_propagates() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_fetch_catalog()
            .returning(|| Err(AppError::DataSource("catalog down".to_string())));
        catalog.expect_name().return_const("mock");

        let engine = RecommendationEngine::new(Arc::new(catalog), Arc::new(MemorySource::default()));
        let result = engine.get_recommendations(&preferences(), None).await;

        assert!(matches!(result, Err(AppError::DataSource(_))));
    }

    #[tokio::test]
    async fn test_behavior_failure_degrades_to_empty_behavior() {
        let mut users = MockUserDataSource::new();
        users
            .expect_fetch_interactions()
            .returning(|_| Err(AppError::DataSource("log down".to_string())));

        let degraded = engine_with(Arc::new(users))
            .get_recommendations(&preferences(), Some(USER))
            .await
            .unwrap();

        let (engine, _) = memory_engine();
        let baseline = engine
            .get_recommendations(&preferences(), Some(USER))
            .await
            .unwrap();

        assert_eq!(degraded, baseline);
    }

    #[tokio::test]
    async fn test_behavior_boosts_scores() {
        let (engine, source) = memory_engine();
        let prefs = UserPreferences {
            countries: vec!["France".to_string()],
            ..Default::default()
        };

        let before = engine.get_recommendations(&prefs, Some(USER)).await.unwrap();
        assert_eq!(before[0].id, CategoryId::General);
        assert_eq!(before[0].programs[0].match_score, 0);

        for (kind, program) in [(InteractionKind::Viewed, 5), (InteractionKind::Saved, 5)] {
            engine
                .record_interaction(Interaction {
                    user_id: USER,
                    kind,
                    program_id: Some(Uuid::from_u128(program)),
                    query: None,
                    occurred_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        assert_eq!(source.fetch_interactions(USER).await.unwrap().len(), 2);

        let after = engine.get_recommendations(&prefs, Some(USER)).await.unwrap();
        let japan = after[0]
            .programs
            .iter()
            .find(|m| m.program.id == Uuid::from_u128(5))
            .unwrap();
        // viewed similar + saved country + saved specialization
        assert_eq!(japan.match_score, 5 + 3 + 2);
        assert_eq!(after[0].programs[0].program.id, Uuid::from_u128(5));
    }

    #[tokio::test]
    async fn test_refresh_matches_initial_load() {
        let (engine, _) = memory_engine();
        let initial = engine.get_recommendations(&preferences(), Some(USER)).await.unwrap();
        let refreshed = engine.refresh(&preferences(), Some(USER)).await.unwrap();
        assert_eq!(initial, refreshed);
    }

    #[tokio::test]
    async fn test_preferences_for_degrades_to_empty() {
        let mut users = MockUserDataSource::new();
        users
            .expect_fetch_user_preferences()
            .returning(|_| Err(AppError::DataSource("store down".to_string())));

        let engine = engine_with(Arc::new(users));
        assert_eq!(engine.preferences_for(USER).await, UserPreferences::default());
    }

    #[tokio::test]
    async fn test_preferences_for_returns_stored() {
        let (engine, source) = memory_engine();
        source.set_preferences(USER, preferences()).await;
        assert_eq!(engine.preferences_for(USER).await, preferences());
    }

    #[tokio::test]
    async fn test_record_interaction_validation() {
        let (engine, _) = memory_engine();

        let missing_program = Interaction {
            user_id: USER,
            kind: InteractionKind::Saved,
            program_id: None,
            query: None,
            occurred_at: Utc::now(),
        };
        assert!(matches!(
            engine.record_interaction(missing_program).await,
            Err(AppError::InvalidInput(_))
        ));

        let blank_search = Interaction {
            user_id: USER,
            kind: InteractionKind::Searched,
            program_id: None,
            query: Some("  ".to_string()),
            occurred_at: Utc::now(),
        };
        assert!(matches!(
            engine.record_interaction(blank_search).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_record_interaction_unknown_program_rejected() {
        let (engine, source) = memory_engine();

        let unknown = Interaction {
            user_id: USER,
            kind: InteractionKind::Viewed,
            program_id: Some(Uuid::from_u128(404)),
            query: None,
            occurred_at: Utc::now(),
        };
        assert!(matches!(
            engine.record_interaction(unknown).await,
            Err(AppError::NotFound(_))
        ));
        assert!(source.fetch_interactions(USER).await.unwrap().is_empty());

        let search = Interaction {
            user_id: USER,
            kind: InteractionKind::Searched,
            program_id: None,
            query: Some("robotics".to_string()),
            occurred_at: Utc::now(),
        };
        engine.record_interaction(search).await.unwrap();
        assert_eq!(source.fetch_interactions(USER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_similarity_tables() {
        let prefs = UserPreferences {
            countries: vec!["Chile".to_string()],
            ..Default::default()
        };
        let japan = Uuid::from_u128(5);
        let score_of = |categories: Vec<RecommendationCategory>| {
            categories
                .into_iter()
                .flat_map(|c| c.programs)
                .find(|m| m.program.id == japan)
                .map(|m| m.match_score)
        };

        let (engine, _) = memory_engine();
        let default_score = score_of(engine.get_recommendations(&prefs, None).await.unwrap());
        assert_eq!(default_score, Some(0));

        let tables = SimilarityTables::new(&[("Japan", &["Chile"][..])], &[]);
        let engine = engine.with_scorer(MatchScorer::new(tables));
        let custom_score = score_of(engine.get_recommendations(&prefs, None).await.unwrap());
        assert_eq!(custom_score, Some(15));
    }
}
