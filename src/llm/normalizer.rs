//! Query normalization: translate the incoming question to English before
//! embedding, so retrieval works against an English-indexed corpus.
//!
//! Failure here is never fatal. Any problem with the completion call
//! degrades to the original text, and the outcome is reported as a status
//! flag so callers can observe the degraded path.

use std::sync::Arc;

use crate::llm::completion::CompletionClient;
use crate::llm::types::{ChatMessage, ChatRequest};

const SYSTEM_INSTRUCTION: &str = "You translate user queries into English for a search system. \
Output only the translated query, nothing else. If the query is already \
in English, return it unchanged. Never answer the query or elaborate.";

#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    pub text: String,
    /// Whether the completion call actually produced the text, as opposed
    /// to the degraded passthrough of the original.
    pub translated: bool,
}

#[derive(Clone)]
pub struct QueryNormalizer {
    completion: Option<Arc<CompletionClient>>,
}

impl QueryNormalizer {
    pub fn new(completion: Option<Arc<CompletionClient>>) -> Self {
        Self { completion }
    }

    pub async fn normalize(&self, text: &str) -> NormalizedQuery {
        let Some(client) = &self.completion else {
            return NormalizedQuery {
                text: text.to_string(),
                translated: false,
            };
        };

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(text),
        ])
        .with_temperature(0.0);

        match client.chat(request).await {
            Ok(Some(translated)) => NormalizedQuery {
                text: translated,
                translated: true,
            },
            Ok(None) => {
                tracing::warn!("Translation returned no content, using original query");
                NormalizedQuery {
                    text: text.to_string(),
                    translated: false,
                }
            }
            Err(err) => {
                tracing::warn!("Translation failed ({}), using original query", err);
                NormalizedQuery {
                    text: text.to_string(),
                    translated: false,
                }
            }
        }
    }
}
