use std::sync::Arc;

use crate::config::AppConfig;
use crate::embedding::{EmbedderService, HttpEmbeddingProvider};
use crate::llm::{AnswerSynthesizer, CompletionClient, QueryNormalizer};
use crate::rag::{QueryPipeline, VectorStoreClient};
use crate::retry::{ResilientClient, RetryPolicy};

pub struct AppState {
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub embedder: Arc<EmbedderService>,
    pub pipeline: QueryPipeline,
}

impl AppState {
    pub fn initialize(config: AppConfig) -> Arc<Self> {
        let http = reqwest::Client::new();

        let primary = Arc::new(HttpEmbeddingProvider::new(
            http.clone(),
            config.embedding_base_url.clone(),
            config.embedding_api_key.clone(),
            config.embedding_model.clone(),
        ));
        let fallback = Arc::new(HttpEmbeddingProvider::new(
            http.clone(),
            config.embedding_base_url.clone(),
            config.embedding_api_key.clone(),
            config.embedding_fallback_model.clone(),
        ));
        let embedder = Arc::new(EmbedderService::new(primary, fallback));

        // No key means both completion-backed stages run degraded.
        let completion = config.completion_api_key.as_ref().map(|key| {
            Arc::new(CompletionClient::new(
                ResilientClient::new(http.clone(), RetryPolicy::default()),
                config.completion_base_url.clone(),
                key.clone(),
                config.completion_model.clone(),
            ))
        });

        let store = VectorStoreClient::new(
            http.clone(),
            config.vector_store_url.clone(),
            config.vector_store_key.clone(),
        );

        let pipeline = QueryPipeline::new(
            embedder.clone(),
            store,
            QueryNormalizer::new(completion.clone()),
            AnswerSynthesizer::new(completion),
        );

        Arc::new(AppState {
            config,
            http,
            embedder,
            pipeline,
        })
    }
}
