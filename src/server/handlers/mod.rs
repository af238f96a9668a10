pub mod documents;
pub mod health;
pub mod news;
pub mod query;
