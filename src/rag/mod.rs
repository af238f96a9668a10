pub mod context_builder;
pub mod pipeline;
pub mod store;

pub use pipeline::{AnswerResult, QueryPipeline};
pub use store::{RetrievedDocument, VectorStoreClient};
