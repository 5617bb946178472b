//! Document store access
//!
//! - `mongo`: shared MongoDB client and typed collections
//! - `schemas`: article and comment documents
//! - `store`: the `ArticleStore` accessor and its MongoDB implementation
//! - `memory`: in-process `ArticleStore` for tests and local development

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use memory::MemoryArticleStore;
pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
pub use schemas::{Article, Comment, ARTICLE_COLLECTION};
pub use store::{ArticleStore, MongoArticleStore};
