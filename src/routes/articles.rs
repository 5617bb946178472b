//! Article engagement endpoints
//!
//! - GET  /api/articles/{name}          - upvotes and comments
//! - POST /api/articles/{name}/upvote   - add one upvote (authenticated)
//! - POST /api/articles/{name}/comments - append a comment (authenticated)
//!
//! Handlers only parse, delegate to the store and serialize. Authentication
//! has already happened by the time a mutating handler runs; the identity is
//! passed in for logging.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::auth::IdentityClaim;
use crate::db::{ArticleStore, Comment};
use crate::routes::json_response;
use crate::types::{ArticlesError, Result};

/// GET /api/articles/{name}
pub async fn get_article(store: &dyn ArticleStore, name: &str) -> Result<Response<Full<Bytes>>> {
    let article = store.get_article(name).await?;
    Ok(json_response(StatusCode::OK, &article))
}

/// POST /api/articles/{name}/upvote
pub async fn upvote_article(
    store: &dyn ArticleStore,
    name: &str,
    identity: &IdentityClaim,
) -> Result<Response<Full<Bytes>>> {
    let article = store.upvote(name).await?;

    info!(
        article = %name,
        subject = %identity.subject,
        email = identity.email.as_deref().unwrap_or("-"),
        display_name = identity.name.as_deref().unwrap_or("-"),
        upvotes = article.upvotes,
        "Article upvoted"
    );

    Ok(json_response(StatusCode::OK, &article))
}

/// POST /api/articles/{name}/comments
///
/// Body: `{"postedBy": string, "text": string}`. Both fields are required
/// strings; their content is not validated.
pub async fn add_comment(
    store: &dyn ArticleStore,
    name: &str,
    body: &[u8],
    identity: &IdentityClaim,
) -> Result<Response<Full<Bytes>>> {
    let comment = parse_comment(body)?;
    let article = store.add_comment(name, comment).await?;

    info!(
        article = %name,
        subject = %identity.subject,
        email = identity.email.as_deref().unwrap_or("-"),
        display_name = identity.name.as_deref().unwrap_or("-"),
        comments = article.comments.len(),
        "Comment added"
    );

    Ok(json_response(StatusCode::OK, &article))
}

/// Request body for a new comment; both fields must be present strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewComment {
    posted_by: String,
    text: String,
}

fn parse_comment(body: &[u8]) -> Result<Comment> {
    serde_json::from_slice::<NewComment>(body)
        .map(|c| Comment::new(c.posted_by, c.text))
        .map_err(|_| ArticlesError::BadRequest("Invalid comment payload".to_string()))
}
