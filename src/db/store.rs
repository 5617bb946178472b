//! Article store accessor
//!
//! Every operation touches exactly one article document. Mutations are a
//! single atomic server-side update that returns the post-update state, so
//! concurrent upvotes or comments on the same article are never lost.
//!
//! Unknown article names are upserted: reads return an empty article and
//! writes create the document as part of the same atomic update.

use async_trait::async_trait;
use bson::{doc, Document};
use tracing::debug;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{Article, Comment, ARTICLE_COLLECTION};
use crate::types::{ArticlesError, Result};

/// Read and atomic-update access to article documents
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Current state of an article; empty when nothing has been recorded yet
    async fn get_article(&self, name: &str) -> Result<Article>;

    /// Increment `upvotes` by one and return the article after the increment
    async fn upvote(&self, name: &str) -> Result<Article>;

    /// Append a comment and return the article after the append
    async fn add_comment(&self, name: &str, comment: Comment) -> Result<Article>;

    /// Release store resources on shutdown
    async fn close(&self) {}
}

/// MongoDB-backed article store
pub struct MongoArticleStore {
    client: MongoClient,
    articles: MongoCollection<Article>,
}

impl MongoArticleStore {
    /// Bind to the articles collection, creating its indexes if needed
    pub async fn new(client: MongoClient) -> Result<Self> {
        let articles = client.collection::<Article>(ARTICLE_COLLECTION).await?;
        Ok(Self { client, articles })
    }

    fn upserted(name: &str, article: Option<Article>) -> Result<Article> {
        // upsert + ReturnDocument::After always yields a document
        article.ok_or_else(|| {
            ArticlesError::Database(format!("Upsert of article '{}' returned no document", name))
        })
    }
}

/// Filter selecting a single article by name
fn article_filter(name: &str) -> Document {
    doc! { "name": name }
}

/// Increment the counter; a new document also gets an empty comment list
fn upvote_update() -> Document {
    doc! {
        "$inc": { "upvotes": 1 },
        "$setOnInsert": { "comments": [] }
    }
}

/// Append a comment; a new document also gets a zero counter
fn comment_update(comment: &Comment) -> Result<Document> {
    let comment = bson::to_bson(comment)
        .map_err(|e| ArticlesError::Internal(format!("Failed to encode comment: {}", e)))?;

    Ok(doc! {
        "$push": { "comments": comment },
        "$setOnInsert": { "upvotes": 0 }
    })
}

#[async_trait]
impl ArticleStore for MongoArticleStore {
    async fn get_article(&self, name: &str) -> Result<Article> {
        let article = self.articles.find_one(article_filter(name)).await?;
        Ok(article.unwrap_or_else(|| Article::empty(name)))
    }

    async fn upvote(&self, name: &str) -> Result<Article> {
        let article = self
            .articles
            .find_one_and_update(article_filter(name), upvote_update(), true)
            .await?;

        debug!(article = %name, "Upvote applied");
        Self::upserted(name, article)
    }

    async fn add_comment(&self, name: &str, comment: Comment) -> Result<Article> {
        let article = self
            .articles
            .find_one_and_update(article_filter(name), comment_update(&comment)?, true)
            .await?;

        debug!(article = %name, "Comment appended");
        Self::upserted(name, article)
    }

    async fn close(&self) {
        self.client.clone().close().await;
    }
}
