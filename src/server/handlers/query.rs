use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub question: Option<String>,
}

pub async fn post_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = payload
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Question required".to_string()))?;

    tracing::info!("Question: {}", question);

    let result = state.pipeline.answer(question).await.map_err(|err| {
        // Full detail stays server-side; the caller gets the message only.
        tracing::error!("Query pipeline failed: {}", err);
        ApiError::from(err)
    })?;

    Ok(Json(result))
}
