use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Embedding model health probe.
///
/// Reports readiness without blocking, and triggers a background warm-up
/// the first time it is hit while the model is still uninitialized.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.embedder.warm_up();

    Json(json!({
        "isReady": state.embedder.is_ready(),
    }))
}
