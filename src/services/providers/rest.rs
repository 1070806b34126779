//! Managed-backend data source over a PostgREST-style HTTP API
//!
//! Tables are exposed as `/rest/v1/<table>` with filter query parameters
//! (`column=eq.value`, `id=in.(a,b)`). Requests authenticate with the
//! project API key, sent both as `apikey` and as a bearer token.

use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Interaction, InteractionKind, Program, UserPreferences},
    services::providers::{CatalogSource, UserDataSource},
};

#[derive(Clone)]
pub struct RestSource {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PreferencesRow {
    preferences: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InteractionRow {
    user_id: Uuid,
    kind: String,
    #[serde(default)]
    program_id: Option<Uuid>,
    #[serde(default)]
    query: Option<String>,
    occurred_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct NewInteraction<'a> {
    user_id: Uuid,
    kind: &'a str,
    program_id: Option<Uuid>,
    query: Option<&'a str>,
    occurred_at: DateTime<Utc>,
}

impl RestSource {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Issues a GET against `table` and decodes the JSON array response
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> AppResult<Vec<T>> {
        let request = self
            .http_client
            .get(self.table_url(table))
            .query(query);

        let response = self.authorized(request).send().await?;
        let response = Self::check_status(table, response).await?;

        Ok(response.json().await?)
    }

    async fn check_status(table: &str, response: Response) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            table = %table,
            status = %status,
            body = %body,
            "Data source request failed"
        );

        Err(AppError::DataSource(format!(
            "{} returned status {}: {}",
            table, status, body
        )))
    }
}

/// Formats ids as a PostgREST `in.(...)` filter
fn in_filter(ids: &[Uuid]) -> String {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({})", joined)
}

#[async_trait::async_trait]
impl CatalogSource for RestSource {
    async fn fetch_catalog(&self) -> AppResult<Vec<Program>> {
        let programs: Vec<Program> = self
            .select(
                "programs",
                &[
                    ("select", "*".to_string()),
                    ("active", "eq.true".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;

        tracing::debug!(program_count = programs.len(), "Fetched catalog from REST backend");

        Ok(programs)
    }

    async fn fetch_programs(&self, ids: &[Uuid]) -> AppResult<Vec<Program>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.select(
            "programs",
            &[("select", "*".to_string()), ("id", in_filter(ids))],
        )
        .await
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

#[async_trait::async_trait]
impl UserDataSource for RestSource {
    async fn fetch_user_preferences(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>> {
        let rows: Vec<PreferencesRow> = self
            .select(
                "user_preferences",
                &[
                    ("select", "preferences".to_string()),
                    ("user_id", format!("eq.{}", user_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let preferences = serde_json::from_value(row.preferences).map_err(|e| {
            AppError::DataSource(format!("Stored preferences are malformed: {}", e))
        })?;

        Ok(Some(preferences))
    }

    async fn fetch_interactions(&self, user_id: Uuid) -> AppResult<Vec<Interaction>> {
        let rows: Vec<InteractionRow> = self
            .select(
                "user_interactions",
                &[
                    ("select", "user_id,kind,program_id,query,occurred_at".to_string()),
                    ("user_id", format!("eq.{}", user_id)),
                    ("order", "occurred_at.asc".to_string()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let kind = InteractionKind::parse(&row.kind).or_else(|| {
                    tracing::warn!(kind = %row.kind, "Skipping interaction with unknown kind");
                    None
                })?;

                Some(Interaction {
                    user_id: row.user_id,
                    kind,
                    program_id: row.program_id,
                    query: row.query,
                    occurred_at: row.occurred_at,
                })
            })
            .collect())
    }

    async fn record_interaction(&self, interaction: Interaction) -> AppResult<()> {
        let body = NewInteraction {
            user_id: interaction.user_id,
            kind: interaction.kind.as_str(),
            program_id: interaction.program_id,
            query: interaction.query.as_deref(),
            occurred_at: interaction.occurred_at,
        };

        let request = self
            .http_client
            .post(self.table_url("user_interactions"))
            .header("Prefer", "return=minimal")
            .json(&body);

        let response = self.authorized(request).send().await?;
        Self::check_status("user_interactions", response).await?;

        Ok(())
    }
}
