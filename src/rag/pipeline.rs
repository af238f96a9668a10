//! Query orchestration: model load → normalize → embed → retrieve →
//! assemble → synthesize, producing one uniform result per request.

use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::PipelineError;
use crate::embedding::EmbedderService;
use crate::llm::{AnswerSynthesizer, QueryNormalizer};
use crate::rag::context_builder::{build_context, document_title, parse_metadata, truncate_chars};
use crate::rag::store::{RetrievedDocument, VectorStoreClient};

pub const MATCH_COUNT: u32 = 5;
pub const MATCH_THRESHOLD: f32 = 0.3;
/// Snippet length in the response document summaries, shorter than the
/// context snippets.
const SUMMARY_SNIPPET_MAX: usize = 200;

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub rank: usize,
    pub title: String,
    /// Similarity formatted to 4 decimal places.
    pub similarity: String,
    pub snippet: String,
}

#[derive(Debug, Serialize)]
pub struct DebugMetrics {
    pub embed_dim: usize,
    pub docs_total: usize,
    pub translated: bool,
}

#[derive(Debug, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    pub retrieved_docs: Vec<DocumentSummary>,
    pub debug: DebugMetrics,
}

pub struct QueryPipeline {
    embedder: Arc<EmbedderService>,
    store: VectorStoreClient,
    normalizer: QueryNormalizer,
    synthesizer: AnswerSynthesizer,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<EmbedderService>,
        store: VectorStoreClient,
        normalizer: QueryNormalizer,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            embedder,
            store,
            normalizer,
            synthesizer,
        }
    }

    pub async fn answer(&self, question: &str) -> Result<AnswerResult, PipelineError> {
        self.embedder.ensure_loaded().await?;

        let normalized = self.normalizer.normalize(question).await;
        if normalized.translated {
            tracing::debug!("Normalized query: {}", normalized.text);
        }

        let vector = self.embedder.embed(&normalized.text).await?;
        tracing::info!("Embedding dim: {}", vector.len());

        let docs = self
            .store
            .search(&vector, self.embedder.dimension(), MATCH_COUNT, MATCH_THRESHOLD)
            .await?;
        tracing::info!("Retrieved docs: {}", docs.len());

        let context = build_context(&docs);
        // The synthesizer answers the original question, not the translation.
        let answer = self.synthesizer.synthesize(question, &context).await?;

        Ok(AnswerResult {
            answer,
            retrieved_docs: summarize(&docs),
            debug: DebugMetrics {
                embed_dim: vector.len(),
                docs_total: docs.len(),
                translated: normalized.translated,
            },
        })
    }
}

fn summarize(docs: &[RetrievedDocument]) -> Vec<DocumentSummary> {
    docs.iter()
        .take(MATCH_COUNT as usize)
        .enumerate()
        .map(|(i, doc)| {
            let metadata = parse_metadata(&doc.metadata);
            DocumentSummary {
                rank: i + 1,
                title: document_title(&metadata),
                similarity: format!("{:.4}", doc.similarity),
                snippet: truncate_chars(&doc.content, SUMMARY_SNIPPET_MAX),
            }
        })
        .collect()
}
