//! Vector store similarity search over the Supabase-style RPC contract.
//!
//! Filtering and ordering are the store's job; this client passes the
//! match parameters through verbatim. The only local validation is the
//! query vector dimension, checked before any network call. RPC failures
//! are never retried here.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::errors::PipelineError;

/// One similarity match from the store, similarity-descending on arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    #[serde(default)]
    pub content: String,
    /// Either a JSON object or a JSON-encoded string, store-dependent.
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub similarity: f32,
}

#[derive(Clone)]
pub struct VectorStoreClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl VectorStoreClient {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    /// Call `match_documents` with the given query vector.
    ///
    /// `expected_dim` is the model dimension recorded at load time; a
    /// mismatched vector fails fast without touching the network.
    pub async fn search(
        &self,
        embedding: &[f32],
        expected_dim: usize,
        match_count: u32,
        match_threshold: f32,
    ) -> Result<Vec<RetrievedDocument>, PipelineError> {
        if embedding.len() != expected_dim {
            return Err(PipelineError::Retrieval(format!(
                "query vector dimension {} does not match model dimension {expected_dim}",
                embedding.len()
            )));
        }

        let url = format!("{}/rest/v1/rpc/match_documents", self.base_url);
        let body = json!({
            "query_embedding": embedding,
            "match_count": match_count,
            "match_threshold": match_threshold,
        });

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::retrieval)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Retrieval(format!(
                "vector store RPC error {status}: {text}"
            )));
        }

        response.json().await.map_err(PipelineError::retrieval)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    async fn spawn_store(reply: Value) -> (SocketAddr, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new().route(
            "/rest/v1/rpc/match_documents",
            post({
                let hits = hits.clone();
                move || {
                    let hits = hits.clone();
                    let reply = reply.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(reply)
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, hits)
    }

    fn store_client(addr: SocketAddr) -> VectorStoreClient {
        VectorStoreClient::new(
            reqwest::Client::new(),
            format!("http://{addr}"),
            "service-key".to_string(),
        )
    }

    #[tokio::test]
    async fn returns_documents_within_requested_bounds() {
        let (addr, _) = spawn_store(json!([
            {"content": "Jahe baik untuk pencernaan", "metadata": {"title": "Jahe"}, "similarity": 0.8},
            {"content": "Kunyit mengandung kurkumin", "metadata": {"title": "Kunyit"}, "similarity": 0.5},
        ]))
        .await;

        let docs = store_client(addr)
            .search(&vec![0.1; 384], 384, 5, 0.3)
            .await
            .unwrap();

        assert!(docs.len() <= 5);
        assert!(docs.iter().all(|d| d.similarity >= 0.3));
        assert!(docs.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[tokio::test]
    async fn dimension_mismatch_fails_without_network_call() {
        let (addr, hits) = spawn_store(json!([])).await;

        let err = store_client(addr)
            .search(&vec![0.1; 100], 384, 5, 0.3)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Retrieval(_)));
        assert!(err.to_string().contains("dimension"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rpc_failure_wraps_cause() {
        let app = Router::new().route(
            "/rest/v1/rpc/match_documents",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "function missing").into_response() }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let err = store_client(addr)
            .search(&vec![0.1; 8], 8, 5, 0.3)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("function missing"));
    }

    #[tokio::test]
    async fn tolerates_string_encoded_metadata() {
        let (addr, _) = spawn_store(json!([
            {"content": "abc", "metadata": "{\"title\":\"Jahe\"}", "similarity": 0.9},
        ]))
        .await;

        let docs = store_client(addr)
            .search(&vec![0.1; 8], 8, 5, 0.3)
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert!(docs[0].metadata.is_string());
    }
}
