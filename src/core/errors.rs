use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures produced by the query pipeline stages.
///
/// Translation failures never appear here: the normalizer recovers them
/// locally and reports a status flag instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("embedding model unavailable: {0}")]
    ModelLoad(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("rate limit exhausted after {attempts} attempts calling {endpoint}")]
    RateLimitExhausted { endpoint: String, attempts: u32 },

    #[error("completion request failed: {0}")]
    Completion(String),

    #[error("completion API error {status}: {body}")]
    Synthesis { status: u16, body: String },
}

impl PipelineError {
    pub fn retrieval<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Retrieval(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PipelineError> for ApiError {
    // Callers only ever see the human-readable message.
    fn from(err: PipelineError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_messages_are_flat() {
        let err = PipelineError::RateLimitExhausted {
            endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            attempts: 5,
        };
        let api: ApiError = err.into();
        match api {
            ApiError::Internal(msg) => {
                assert!(msg.contains("5 attempts"));
                assert!(msg.contains("api.mistral.ai"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn synthesis_error_carries_status_and_body() {
        let err = PipelineError::Synthesis {
            status: 503,
            body: "upstream overloaded".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("upstream overloaded"));
    }
}
