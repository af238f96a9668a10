use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

/// List the PDF documents available in the configured documents directory.
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let read_failed = |err: std::io::Error| {
        tracing::error!("Failed to read documents directory: {}", err);
        ApiError::Internal("Failed to load document list".to_string())
    };

    let mut entries = tokio::fs::read_dir(&state.config.documents_dir)
        .await
        .map_err(read_failed)?;

    let mut documents = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.to_lowercase().ends_with(".pdf") {
            documents.push(json!({ "file": name }));
        }
    }
    documents.sort_by(|a, b| a["file"].as_str().cmp(&b["file"].as_str()));

    Ok(Json(json!({ "documents": documents })))
}
