pub mod provider;
pub mod service;

pub use provider::{EmbeddingProvider, HttpEmbeddingProvider};
pub use service::EmbedderService;
