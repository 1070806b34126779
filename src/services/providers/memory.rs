use std::collections::HashMap;
use std::path::Path;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Interaction, Program, UserPreferences},
    services::providers::{CatalogSource, UserDataSource},
};

/// In-process data source
///
/// Holds a fixed catalog plus per-user preferences and an interaction log.
/// Used for local runs (seeded from a JSON catalog file) and in tests.
#[derive(Default)]
pub struct MemorySource {
    programs: Vec<Program>,
    preferences: RwLock<HashMap<Uuid, UserPreferences>>,
    interactions: RwLock<Vec<Interaction>>,
}

impl MemorySource {
    /// Creates a source serving `programs`, kept newest first
    pub fn new(mut programs: Vec<Program>) -> Self {
        programs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            programs,
            ..Default::default()
        }
    }

    /// Loads a catalog from a JSON array of programs
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read catalog {}: {}", path.display(), e))?;
        let programs: Vec<Program> = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Failed to parse catalog {}: {}", path.display(), e))?;

        tracing::info!(
            path = %path.display(),
            program_count = programs.len(),
            "Loaded program catalog"
        );

        Ok(Self::new(programs))
    }

    /// Stores preferences for a user, replacing earlier ones
    pub async fn set_preferences(&self, user_id: Uuid, preferences: UserPreferences) {
        self.preferences.write().await.insert(user_id, preferences);
    }
}

#[async_trait::async_trait]
impl CatalogSource for MemorySource {
    async fn fetch_catalog(&self) -> AppResult<Vec<Program>> {
        Ok(self.programs.clone())
    }

    async fn fetch_programs(&self, ids: &[Uuid]) -> AppResult<Vec<Program>> {
        Ok(self
            .programs
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait::async_trait]
impl UserDataSource for MemorySource {
    async fn fetch_user_preferences(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>> {
        Ok(self.preferences.read().await.get(&user_id).cloned())
    }

    async fn fetch_interactions(&self, user_id: Uuid) -> AppResult<Vec<Interaction>> {
        Ok(self
            .interactions
            .read()
            .await
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn record_interaction(&self, interaction: Interaction) -> AppResult<()> {
        self.interactions.write().await.push(interaction);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InteractionKind;
    use chrono::{TimeZone, Utc};

    fn program(id: u128, year: i32) -> Program {
        Program {
            id: Uuid::from_u128(id),
            university: "Test University".to_string(),
            name: format!("Program {}", id),
            degree_type: "Master".to_string(),
            country: "Canada".to_string(),
            city: "Toronto".to_string(),
            tuition_fee: Some(1000.0),
            specialization: String::new(),
            duration: "2 years".to_string(),
            study_level: "Master".to_string(),
            language_requirements: String::new(),
            scholarship_available: false,
            created_at: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_catalog_newest_first() {
        let source = MemorySource::new(vec![program(1, 2020), program(2, 2023), program(3, 2021)]);
        let ids: Vec<Uuid> = source
            .fetch_catalog()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![Uuid::from_u128(2), Uuid::from_u128(3), Uuid::from_u128(1)]);
    }

    #[tokio::test]
    async fn test_fetch_programs_ignores_unknown_ids() {
        let source = MemorySource::new(vec![program(1, 2020)]);
        let found = source
            .fetch_programs(&[Uuid::from_u128(1), Uuid::from_u128(99)])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_interactions_are_appended_per_user() {
        let source = MemorySource::default();
        let alice = Uuid::from_u128(100);
        let bob = Uuid::from_u128(200);

        for (user, program) in [(alice, 1), (bob, 2), (alice, 3)] {
            source
                .record_interaction(Interaction {
                    user_id: user,
                    kind: InteractionKind::Viewed,
                    program_id: Some(Uuid::from_u128(program)),
                    query: None,
                    occurred_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let history = source.fetch_interactions(alice).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].program_id, Some(Uuid::from_u128(3)));
    }

    #[tokio::test]
    async fn test_preferences_absent_until_set() {
        let source = MemorySource::default();
        let user = Uuid::from_u128(7);
        assert_eq!(source.fetch_user_preferences(user).await.unwrap(), None);

        let prefs = UserPreferences {
            countries: vec!["Canada".to_string()],
            ..Default::default()
        };
        source.set_preferences(user, prefs.clone()).await;
        assert_eq!(source.fetch_user_preferences(user).await.unwrap(), Some(prefs));
    }
}
