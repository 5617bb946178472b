//! Article document schema
//!
//! Stores per-article engagement: an upvote counter and an append-only
//! comment list. Article bodies themselves live in the front end.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::IntoIndexes;

/// Collection name for articles
pub const ARTICLE_COLLECTION: &str = "articles";

/// Article document stored in MongoDB
///
/// The MongoDB `_id` is not modelled, so it is dropped on read and never
/// reaches API responses.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Article {
    /// Article slug, unique and assigned outside this service
    pub name: String,

    /// Upvote counter; absent in the store means zero
    ///
    /// Documents seeded by other tools may hold the counter as a double.
    #[serde(default, deserialize_with = "lenient_count")]
    pub upvotes: i64,

    /// Comments in insertion order
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Comment embedded in an article
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Display name of the author (unvalidated); stored nulls read as ""
    #[serde(default, deserialize_with = "null_as_empty")]
    pub posted_by: String,
    pub text: String,
}

impl Article {
    /// Article with no recorded engagement yet
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upvotes: 0,
            comments: Vec::new(),
        }
    }
}

impl Comment {
    pub fn new(posted_by: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            posted_by: posted_by.into(),
            text: text.into(),
        }
    }
}

/// Accept Int32, Int64 and whole-number Double counters
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a whole number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("counter {} out of range", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::custom(format!("counter {} is not a whole number", v)))
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl IntoIndexes for Article {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on name; also lets concurrent upserts resolve to one document
            (
                doc! { "name": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("name_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_uses_camel_case_on_the_wire() {
        let json = serde_json::to_value(Comment::new("Ana", "Nice!")).unwrap();
        assert_eq!(json, serde_json::json!({ "postedBy": "Ana", "text": "Nice!" }));
    }

    #[test]
    fn test_missing_counters_default_to_empty() {
        let article: Article = serde_json::from_str(r#"{"name":"learn-react"}"#).unwrap();
        assert_eq!(article, Article::empty("learn-react"));
    }

    #[test]
    fn test_store_id_is_dropped() {
        let stored = doc! {
            "_id": bson::oid::ObjectId::new(),
            "name": "learn-node",
            "upvotes": 3,
            "comments": [ { "postedBy": "Bo", "text": "ok" } ],
        };
        let article: Article = bson::from_document(stored).unwrap();
        assert_eq!(article.upvotes, 3);
        assert_eq!(article.comments, vec![Comment::new("Bo", "ok")]);

        let json = serde_json::to_value(&article).unwrap();
        assert!(json.get("_id").is_none());
    }

    #[test]
    fn test_double_counter_decodes() {
        let stored = doc! { "name": "learn-node", "upvotes": 0.0_f64, "comments": [] };
        let article: Article = bson::from_document(stored).unwrap();
        assert_eq!(article.upvotes, 0);

        let stored = doc! { "name": "learn-node", "upvotes": 7.0_f64 };
        assert_eq!(bson::from_document::<Article>(stored).unwrap().upvotes, 7);

        let stored = doc! { "name": "learn-node", "upvotes": 5_i32 };
        assert_eq!(bson::from_document::<Article>(stored).unwrap().upvotes, 5);

        let stored = doc! { "name": "learn-node", "upvotes": 1.5_f64 };
        assert!(bson::from_document::<Article>(stored).is_err());
    }

    #[test]
    fn test_null_author_reads_as_empty() {
        let stored = doc! {
            "name": "learn-node",
            "upvotes": 1_i64,
            "comments": [
                { "postedBy": bson::Bson::Null, "text": "anonymous" },
                { "text": "no author field" },
            ],
        };
        let article: Article = bson::from_document(stored).unwrap();
        assert_eq!(
            article.comments,
            vec![Comment::new("", "anonymous"), Comment::new("", "no author field")]
        );
    }

    #[test]
    fn test_name_index_is_unique() {
        let indices = Article::into_indices();
        assert_eq!(indices.len(), 1);
        let (keys, opts) = &indices[0];
        assert_eq!(keys, &doc! { "name": 1 });
        assert_eq!(opts.as_ref().and_then(|o| o.unique), Some(true));
    }
}
