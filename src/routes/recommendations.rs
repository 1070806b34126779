use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{RecommendationCategory, UserPreferences},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    /// Preferences to score against; stored ones are used when omitted
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
    /// Enables behavior boosts from this user's interaction log
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl RecommendationRequest {
    async fn resolve_preferences(&self, state: &AppState) -> UserPreferences {
        match (&self.preferences, self.user_id) {
            (Some(preferences), _) => preferences.clone(),
            (None, Some(user_id)) => state.engine.preferences_for(user_id).await,
            (None, None) => UserPreferences::default(),
        }
    }
}

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<RecommendationCategory>>> {
    tracing::info!(
        request_id = %request_id,
        user_id = ?request.user_id,
        explicit_preferences = request.preferences.is_some(),
        "Processing recommendation request"
    );

    let preferences = request.resolve_preferences(&state).await;
    let categories = state
        .engine
        .get_recommendations(&preferences, request.user_id)
        .await?;

    Ok(Json(categories))
}

/// Handler for user-triggered recomputation
pub async fn refresh(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<RecommendationCategory>>> {
    tracing::info!(
        request_id = %request_id,
        user_id = ?request.user_id,
        "Refreshing recommendations"
    );

    let preferences = request.resolve_preferences(&state).await;
    let categories = state.engine.refresh(&preferences, request.user_id).await?;

    Ok(Json(categories))
}
