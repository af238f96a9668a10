pub mod completion;
pub mod normalizer;
pub mod synthesizer;
pub mod types;

pub use completion::CompletionClient;
pub use normalizer::{NormalizedQuery, QueryNormalizer};
pub use synthesizer::AnswerSynthesizer;
