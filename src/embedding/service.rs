//! Embedding model lifecycle: UNINITIALIZED → LOADING → READY (terminal).
//!
//! The service is an explicit, injectable object shared across requests.
//! First-load races are serialized by a mutex held across the provider
//! probe, so concurrent callers queue and observe READY once the winner
//! finishes. A probe embedding determines the model dimension, which is
//! then constant for the process lifetime.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use crate::core::errors::PipelineError;
use crate::embedding::provider::EmbeddingProvider;

const PROBE_TEXT: &str = "warmup";

pub struct EmbedderService {
    primary: Arc<dyn EmbeddingProvider>,
    fallback: Arc<dyn EmbeddingProvider>,
    load_lock: Mutex<()>,
    ready: AtomicBool,
    loading: AtomicBool,
    dimension: AtomicUsize,
    active: RwLock<Option<Arc<dyn EmbeddingProvider>>>,
}

impl EmbedderService {
    pub fn new(primary: Arc<dyn EmbeddingProvider>, fallback: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            primary,
            fallback,
            load_lock: Mutex::new(()),
            ready: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            dimension: AtomicUsize::new(0),
            active: RwLock::new(None),
        }
    }

    /// Current readiness, without blocking.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Model dimension recorded by the load probe. Zero before READY.
    pub fn dimension(&self) -> usize {
        self.dimension.load(Ordering::Acquire)
    }

    /// Kick off a background load if the model is still UNINITIALIZED.
    ///
    /// Returns immediately; the load itself is serialized by the same
    /// mutex as `ensure_loaded`, so duplicate triggers are harmless.
    pub fn warm_up(self: &Arc<Self>) {
        if self.is_ready() || self.loading.load(Ordering::Acquire) {
            return;
        }
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.ensure_loaded().await {
                tracing::error!("Background embedder load failed: {}", err);
            }
        });
    }

    /// Idempotent load: a no-op once READY.
    ///
    /// Probes the primary provider, then the fallback. Both failing leaves
    /// the state non-READY and surfaces `ModelLoad`.
    pub async fn ensure_loaded(&self) -> Result<(), PipelineError> {
        if self.is_ready() {
            return Ok(());
        }

        let _guard = self.load_lock.lock().await;
        if self.is_ready() {
            return Ok(());
        }

        self.loading.store(true, Ordering::Release);
        let result = self.load().await;
        self.loading.store(false, Ordering::Release);
        result
    }

    async fn load(&self) -> Result<(), PipelineError> {
        tracing::info!("Loading embedder ({})", self.primary.model_id());
        let primary_err = match self.probe(&self.primary).await {
            Ok(()) => {
                tracing::info!("Embedder loaded ({})", self.primary.model_id());
                return Ok(());
            }
            Err(err) => err,
        };

        tracing::warn!(
            "Primary embedder failed ({}), trying fallback {}",
            primary_err,
            self.fallback.model_id()
        );
        match self.probe(&self.fallback).await {
            Ok(()) => {
                tracing::info!("Fallback embedder loaded ({})", self.fallback.model_id());
                Ok(())
            }
            Err(fallback_err) => Err(PipelineError::ModelLoad(format!(
                "primary ({}): {primary_err}; fallback ({}): {fallback_err}",
                self.primary.model_id(),
                self.fallback.model_id()
            ))),
        }
    }

    async fn probe(&self, provider: &Arc<dyn EmbeddingProvider>) -> Result<(), PipelineError> {
        let vector = provider.embed(PROBE_TEXT).await?;
        self.dimension.store(vector.len(), Ordering::Release);
        *self.active.write().expect("active provider lock poisoned") = Some(provider.clone());
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Embed one text with the active provider, enforcing the dimension
    /// invariant established at load time.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        self.ensure_loaded().await?;

        let provider = self
            .active
            .read()
            .expect("active provider lock poisoned")
            .clone()
            .ok_or_else(|| PipelineError::ModelLoad("no active embedding provider".to_string()))?;

        let vector = provider.embed(text).await?;
        let expected = self.dimension();
        if vector.len() != expected {
            return Err(PipelineError::Embedding(format!(
                "embedding dimension changed: got {}, expected {expected}",
                vector.len()
            )));
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct FakeProvider {
        id: String,
        dim: usize,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(id: &str, dim: usize, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                dim,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeProvider {
        fn model_id(&self) -> &str {
            &self.id
        }

        async fn embed(&self, _input: &str) -> Result<Vec<f32>, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::Embedding("provider down".to_string()));
            }
            Ok(vec![0.5; self.dim])
        }
    }

    #[tokio::test]
    async fn ensure_loaded_is_idempotent() {
        let primary = FakeProvider::new("primary", 384, false);
        let service = EmbedderService::new(primary.clone(), FakeProvider::new("fb", 384, false));

        for _ in 0..5 {
            service.ensure_loaded().await.unwrap();
        }

        assert!(service.is_ready());
        assert_eq!(service.dimension(), 384);
        // Exactly one probe, no matter how often callers re-check.
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn falls_back_when_primary_fails() {
        let primary = FakeProvider::new("primary", 384, true);
        let fallback = FakeProvider::new("fallback", 384, false);
        let service = EmbedderService::new(primary, fallback.clone());

        service.ensure_loaded().await.unwrap();

        assert!(service.is_ready());
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
        let vector = service.embed("hello").await.unwrap();
        assert_eq!(vector.len(), 384);
    }

    #[tokio::test]
    async fn both_providers_failing_leaves_state_not_ready() {
        let service = EmbedderService::new(
            FakeProvider::new("primary", 0, true),
            FakeProvider::new("fallback", 0, true),
        );

        let err = service.ensure_loaded().await.unwrap_err();
        assert!(matches!(err, PipelineError::ModelLoad(_)));
        assert!(!service.is_ready());

        // A later call retries the load instead of staying wedged.
        assert!(service.ensure_loaded().await.is_err());
    }

    #[tokio::test]
    async fn concurrent_loads_probe_once() {
        let primary = FakeProvider::new("primary", 8, false);
        let service = Arc::new(EmbedderService::new(
            primary.clone(),
            FakeProvider::new("fb", 8, false),
        ));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.ensure_loaded().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn warm_up_loads_in_background() {
        let service = Arc::new(EmbedderService::new(
            FakeProvider::new("primary", 4, false),
            FakeProvider::new("fb", 4, false),
        ));

        assert!(!service.is_ready());
        service.warm_up();

        let mut waited = Duration::ZERO;
        while !service.is_ready() && waited < Duration::from_secs(2) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        assert!(service.is_ready());
    }
}
