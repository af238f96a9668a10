use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::errors::PipelineError;

/// A source of fixed-dimension embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, for logging and diagnostics.
    fn model_id(&self) -> &str;

    /// Embed a single input text.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, PipelineError>;
}

/// OpenAI-compatible `/v1/embeddings` provider.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl HttpEmbeddingProvider {
    pub fn new(client: Client, base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>, PipelineError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": input,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Embedding(format!(
                "embedding server error {status}: {text}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Embedding(e.to_string()))?;

        parse_embedding(&payload)
    }
}

/// Extract `data[0].embedding` as a vector of floats.
///
/// The payload shape is validated once here; anything else is a typed
/// error rather than a fallback guess.
fn parse_embedding(payload: &Value) -> Result<Vec<f32>, PipelineError> {
    let values = payload
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            PipelineError::Embedding("malformed embedding payload: missing data[0].embedding".to_string())
        })?;

    let vector = values
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| {
            PipelineError::Embedding("malformed embedding payload: non-numeric value".to_string())
        })?;

    if vector.is_empty() {
        return Err(PipelineError::Embedding(
            "embedding payload contained an empty vector".to_string(),
        ));
    }

    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_payload() {
        let payload = json!({"data": [{"embedding": [0.1, 0.2, 0.3]}]});
        let vector = parse_embedding(&payload).unwrap();
        assert_eq!(vector.len(), 3);
    }

    #[test]
    fn rejects_missing_embedding_field() {
        let payload = json!({"data": [{"index": 0}]});
        assert!(parse_embedding(&payload).is_err());
    }

    #[test]
    fn rejects_non_numeric_values() {
        let payload = json!({"data": [{"embedding": [0.1, "x"]}]});
        assert!(parse_embedding(&payload).is_err());
    }

    #[test]
    fn rejects_empty_vector() {
        let payload = json!({"data": [{"embedding": []}]});
        assert!(parse_embedding(&payload).is_err());
    }
}
