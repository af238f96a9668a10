//! Answer synthesis from retrieved context.
//!
//! Without a completion credential the synthesizer is a no-op returning
//! the retrieval-only sentinel; that is a configuration mode, not an
//! error. With a credential, any non-2xx completion response is fatal for
//! the request.

use std::sync::Arc;

use crate::core::errors::PipelineError;
use crate::llm::completion::CompletionClient;
use crate::llm::types::{ChatMessage, ChatRequest};

pub const RETRIEVAL_ONLY_SENTINEL: &str = "(retrieval only)";
pub const NO_ANSWER_SENTINEL: &str = "(no answer)";
pub const NO_CONTEXT_MARKER: &str = "(no context found)";

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant for herbal medicine.";

#[derive(Clone)]
pub struct AnswerSynthesizer {
    completion: Option<Arc<CompletionClient>>,
}

impl AnswerSynthesizer {
    pub fn new(completion: Option<Arc<CompletionClient>>) -> Self {
        Self { completion }
    }

    /// Deterministic prompt: instruction, assembled context (or its empty
    /// marker), and the original untranslated question.
    pub fn build_prompt(question: &str, context: &str) -> String {
        let context = if context.is_empty() {
            NO_CONTEXT_MARKER
        } else {
            context
        };
        format!(
            "You are a helpful research assistant for herbal medicine. \
Use the following context to answer the question.\n\n\
Context:\n{context}\n\n\
Question: {question}\n\
Answer in Bahasa Indonesia (use bullet points if possible) and include sources (titles)."
        )
    }

    pub async fn synthesize(&self, question: &str, context: &str) -> Result<String, PipelineError> {
        let Some(client) = &self.completion else {
            tracing::info!("No completion API key configured, returning retrieval-only answer");
            return Ok(RETRIEVAL_ONLY_SENTINEL.to_string());
        };

        let prompt = Self::build_prompt(question, context);
        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_INSTRUCTION),
            ChatMessage::user(prompt),
        ]);

        match client.chat(request).await? {
            Some(answer) => Ok(answer),
            None => Ok(NO_ANSWER_SENTINEL.to_string()),
        }
    }
}
