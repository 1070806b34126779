//! PostgreSQL data source
//!
//! Reads the `programs`, `user_preferences` and `user_interactions` tables
//! created by `migrations/`. The interaction table is insert-only.

use chrono::{DateTime, Utc};
use sqlx::{types::BigDecimal, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Interaction, InteractionKind, Program, UserPreferences},
    services::providers::{CatalogSource, UserDataSource},
};

const PROGRAM_COLUMNS: &str = r#"
    id, university, name, degree_type, country, city, tuition_fee,
    specialization, duration, study_level, language_requirements,
    scholarship_available, created_at
"#;

#[derive(Clone)]
pub struct PostgresSource {
    db_pool: PgPool,
}

impl PostgresSource {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProgramRow {
    id: Uuid,
    university: Option<String>,
    name: Option<String>,
    degree_type: Option<String>,
    country: Option<String>,
    city: Option<String>,
    tuition_fee: Option<BigDecimal>,
    specialization: Option<String>,
    duration: Option<String>,
    study_level: Option<String>,
    language_requirements: Option<String>,
    scholarship_available: Option<bool>,
    created_at: DateTime<Utc>,
}

impl From<ProgramRow> for Program {
    fn from(row: ProgramRow) -> Self {
        // NUMERIC → f64; values that do not survive the conversion count as missing
        let tuition_fee = row
            .tuition_fee
            .and_then(|fee| fee.to_string().parse::<f64>().ok())
            .filter(|fee| fee.is_finite());

        Program {
            id: row.id,
            university: row.university.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            degree_type: row.degree_type.unwrap_or_default(),
            country: row.country.unwrap_or_default(),
            city: row.city.unwrap_or_default(),
            tuition_fee,
            specialization: row.specialization.unwrap_or_default(),
            duration: row.duration.unwrap_or_default(),
            study_level: row.study_level.unwrap_or_default(),
            language_requirements: row.language_requirements.unwrap_or_default(),
            scholarship_available: row.scholarship_available.unwrap_or(false),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    user_id: Uuid,
    kind: String,
    program_id: Option<Uuid>,
    query: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl InteractionRow {
    fn into_interaction(self) -> Option<Interaction> {
        let Some(kind) = InteractionKind::parse(&self.kind) else {
            tracing::warn!(kind = %self.kind, "Skipping interaction with unknown kind");
            return None;
        };

        Some(Interaction {
            user_id: self.user_id,
            kind,
            program_id: self.program_id,
            query: self.query,
            occurred_at: self.occurred_at,
        })
    }
}

#[async_trait::async_trait]
impl CatalogSource for PostgresSource {
    async fn fetch_catalog(&self) -> AppResult<Vec<Program>> {
        let query = format!(
            "SELECT {} FROM programs WHERE active = true ORDER BY created_at DESC",
            PROGRAM_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProgramRow>(&query)
            .fetch_all(&self.db_pool)
            .await?;

        tracing::debug!(program_count = rows.len(), "Fetched catalog from database");

        Ok(rows.into_iter().map(Program::from).collect())
    }

    async fn fetch_programs(&self, ids: &[Uuid]) -> AppResult<Vec<Program>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {} FROM programs WHERE id = ANY($1)", PROGRAM_COLUMNS);

        let rows = sqlx::query_as::<_, ProgramRow>(&query)
            .bind(ids)
            .fetch_all(&self.db_pool)
            .await?;

        Ok(rows.into_iter().map(Program::from).collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait::async_trait]
impl UserDataSource for PostgresSource {
    async fn fetch_user_preferences(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>> {
        let row: Option<(sqlx::types::Json<serde_json::Value>,)> =
            sqlx::query_as("SELECT preferences FROM user_preferences WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db_pool)
                .await?;

        let Some((sqlx::types::Json(raw),)) = row else {
            return Ok(None);
        };

        let preferences = serde_json::from_value(raw).map_err(|e| {
            AppError::DataSource(format!("Stored preferences are malformed: {}", e))
        })?;

        Ok(Some(preferences))
    }

    async fn fetch_interactions(&self, user_id: Uuid) -> AppResult<Vec<Interaction>> {
        let rows = sqlx::query_as::<_, InteractionRow>(
            r#"
            SELECT user_id, kind, program_id, query, occurred_at
            FROM user_interactions
            WHERE user_id = $1
            ORDER BY occurred_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(InteractionRow::into_interaction)
            .collect())
    }

    async fn record_interaction(&self, interaction: Interaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_interactions (user_id, kind, program_id, query, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(interaction.user_id)
        .bind(interaction.kind.as_str())
        .bind(interaction.program_id)
        .bind(interaction.query)
        .bind(interaction.occurred_at)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }
}
