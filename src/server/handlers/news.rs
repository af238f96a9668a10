use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

const NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";
const NEWS_QUERY: &str =
    "obat tradisional OR tanaman obat OR pengobatan herbal OR herbal medicine OR jamu";
const PAGE_SIZE: u32 = 9;

#[derive(Debug, Deserialize)]
pub struct NewsParams {
    #[serde(default)]
    pub page: Option<u32>,
}

/// Proxy for the herbal-medicine news feed, keeping the API key
/// server-side.
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewsParams>,
) -> Result<Response, ApiError> {
    let Some(api_key) = &state.config.news_api_key else {
        return Err(ApiError::Internal(
            "News API key is not configured".to_string(),
        ));
    };

    let page = params.page.unwrap_or(1).max(1);
    let url = format!(
        "{NEWS_ENDPOINT}?q={}&language=id&pageSize={PAGE_SIZE}&sortBy=publishedAt&page={page}&apiKey={api_key}",
        urlencoding::encode(NEWS_QUERY)
    );

    let response = state.http.get(&url).send().await.map_err(|err| {
        tracing::error!("News fetch failed: {}", err);
        ApiError::Internal("Failed to reach the news service".to_string())
    })?;

    let status = response.status();
    let payload: Value = response.json().await.map_err(ApiError::internal)?;

    if !status.is_success() {
        let message = payload["message"].as_str().unwrap_or("unknown error");
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Ok((
            status,
            Json(json!({ "error": format!("Failed to fetch news: {message}") })),
        )
            .into_response());
    }

    Ok(Json(payload).into_response())
}
