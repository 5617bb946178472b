//! In-memory article store
//!
//! Same upsert semantics as the MongoDB store. Each mutation runs under the
//! map's per-key entry lock, which gives the single-document atomicity the
//! document store provides.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::db::schemas::{Article, Comment};
use crate::db::store::ArticleStore;
use crate::types::Result;

#[derive(Default)]
pub struct MemoryArticleStore {
    articles: DashMap<String, Article>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an article
    pub fn insert(&self, article: Article) {
        self.articles.insert(article.name.clone(), article);
    }

    /// Number of stored articles
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    fn update(&self, name: &str, apply: impl FnOnce(&mut Article)) -> Article {
        let mut entry = self
            .articles
            .entry(name.to_string())
            .or_insert_with(|| Article::empty(name));
        apply(entry.value_mut());
        entry.value().clone()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn get_article(&self, name: &str) -> Result<Article> {
        Ok(self
            .articles
            .get(name)
            .map(|a| a.value().clone())
            .unwrap_or_else(|| Article::empty(name)))
    }

    async fn upvote(&self, name: &str) -> Result<Article> {
        Ok(self.update(name, |article| article.upvotes += 1))
    }

    async fn add_comment(&self, name: &str, comment: Comment) -> Result<Article> {
        Ok(self.update(name, |article| article.comments.push(comment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unknown_article_reads_as_empty() {
        let store = MemoryArticleStore::new();
        let article = store.get_article("never-written").await.unwrap();

        assert_eq!(article, Article::empty("never-written"));
        // Reads do not create documents
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upvote_upserts_and_returns_post_state() {
        let store = MemoryArticleStore::new();

        let first = store.upvote("learn-react").await.unwrap();
        assert_eq!(first.upvotes, 1);
        assert!(first.comments.is_empty());

        let second = store.upvote("learn-react").await.unwrap();
        assert_eq!(second.upvotes, 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_add_comment_keeps_existing_state() {
        let store = MemoryArticleStore::new();
        store.insert(Article {
            name: "learn-node".to_string(),
            upvotes: 7,
            comments: vec![Comment::new("Bo", "first")],
        });

        let article = store
            .add_comment("learn-node", Comment::new("Ana", "Nice!"))
            .await
            .unwrap();

        assert_eq!(article.upvotes, 7);
        assert_eq!(
            article.comments,
            vec![Comment::new("Bo", "first"), Comment::new("Ana", "Nice!")]
        );
    }

    #[tokio::test]
    async fn test_sequential_comments_preserve_order() {
        let store = MemoryArticleStore::new();
        for i in 0..10 {
            store
                .add_comment("ordered", Comment::new("Ana", format!("comment {}", i)))
                .await
                .unwrap();
        }

        let article = store.get_article("ordered").await.unwrap();
        let texts: Vec<_> = article.comments.iter().map(|c| c.text.clone()).collect();
        let expected: Vec<_> = (0..10).map(|i| format!("comment {}", i)).collect();
        assert_eq!(texts, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upvotes_are_not_lost() {
        let store = Arc::new(MemoryArticleStore::new());
        store.upvote("busy").await.unwrap();

        let k = 200;
        let handles: Vec<_> = (0..k)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.upvote("busy").await })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let article = store.get_article("busy").await.unwrap();
        assert_eq!(article.upvotes, 1 + k);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_comments_are_all_kept() {
        let store = Arc::new(MemoryArticleStore::new());

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .add_comment("thread", Comment::new(format!("user-{}", i), "hi"))
                        .await
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let article = store.get_article("thread").await.unwrap();
        assert_eq!(article.comments.len(), 50);
        for i in 0..50 {
            let author = format!("user-{}", i);
            assert!(article.comments.iter().any(|c| c.posted_by == author));
        }
    }
}
