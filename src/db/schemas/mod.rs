//! Database schemas
//!
//! Defines MongoDB document structures for articles and their comments.

mod article;

pub use article::{Article, Comment, ARTICLE_COLLECTION};
