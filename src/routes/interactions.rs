use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Interaction, InteractionKind},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub kind: InteractionKind,
    #[serde(default)]
    pub program_id: Option<Uuid>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Appends a view/save/apply/search event to the user's interaction log
pub async fn record_interaction(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<InteractionRequest>,
) -> AppResult<StatusCode> {
    tracing::debug!(
        request_id = %request_id,
        user_id = %user_id,
        kind = request.kind.as_str(),
        "Recording interaction"
    );

    state
        .engine
        .record_interaction(Interaction {
            user_id,
            kind: request.kind,
            program_id: request.program_id,
            query: request.query,
            occurred_at: Utc::now(),
        })
        .await?;

    Ok(StatusCode::CREATED)
}
