use serde_json::{json, Value};

use crate::core::errors::PipelineError;
use crate::llm::types::ChatRequest;
use crate::retry::ResilientClient;

/// Bearer-authenticated OpenAI-compatible chat completion client.
///
/// All calls go through the resilient client, so 429 responses follow the
/// shared backoff policy. Prompt semantics live with the callers.
#[derive(Clone)]
pub struct CompletionClient {
    base_url: String,
    api_key: String,
    model: String,
    resilient: ResilientClient,
}

impl CompletionClient {
    pub fn new(
        resilient: ResilientClient,
        base_url: String,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            resilient,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Run a chat completion.
    ///
    /// Non-2xx responses are fatal for the call and carry the captured
    /// status and body. A 2xx response without an answer field yields
    /// `Ok(None)`; distinguishing that from an error is the caller's
    /// contract (sentinel vs. failure).
    pub async fn chat(&self, request: ChatRequest) -> Result<Option<String>, PipelineError> {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(m) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(m));
            }
        }

        let builder = self
            .resilient
            .http()
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body);

        let response = self.resilient.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Synthesis {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = match response.json().await {
            Ok(value) => value,
            Err(_) => return Ok(None),
        };

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::llm::types::ChatMessage;
    use crate::retry::RetryPolicy;

    async fn spawn_completion_server(reply: Value) -> SocketAddr {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let reply = reply.clone();
                async move { Json(reply) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(addr: SocketAddr) -> CompletionClient {
        CompletionClient::new(
            ResilientClient::new(reqwest::Client::new(), RetryPolicy::default()),
            format!("http://{addr}"),
            "test-key".to_string(),
            "test-model".to_string(),
        )
    }

    fn request() -> ChatRequest {
        ChatRequest::new(vec![ChatMessage::user("hello")])
    }

    #[tokio::test]
    async fn parses_answer_content() {
        let addr = spawn_completion_server(json!({
            "choices": [{"message": {"content": "Jahe membantu pencernaan."}}]
        }))
        .await;

        let answer = client(addr).chat(request()).await.unwrap();
        assert_eq!(answer.as_deref(), Some("Jahe membantu pencernaan."));
    }

    #[tokio::test]
    async fn missing_answer_field_is_none() {
        let addr = spawn_completion_server(json!({"choices": []})).await;
        let answer = client(addr).chat(request()).await.unwrap();
        assert!(answer.is_none());
    }

    #[tokio::test]
    async fn non_2xx_carries_status_and_body() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream gone").into_response() }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let err = client(addr).chat(request()).await.unwrap_err();
        match err {
            PipelineError::Synthesis { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream gone");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
