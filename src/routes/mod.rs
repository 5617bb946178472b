//! HTTP routes
//!
//! `Route::resolve` is the route table: it maps a method and path onto a
//! route, and `Route::requires_auth` declares which routes sit behind the
//! authentication gate. The server runs the gate before calling a handler.

pub mod articles;
pub mod health;
pub mod static_files;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};
use serde::Serialize;

use crate::types::ArticlesError;

pub use articles::{add_comment, get_article, upvote_article};
pub use health::hello;
pub use static_files::serve_static;

const ARTICLES_PREFIX: &str = "/api/articles/";

/// A resolved request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// CORS preflight for any path
    Preflight,
    /// GET /hello
    Hello,
    /// GET /api/articles/{name}
    GetArticle(String),
    /// POST /api/articles/{name}/upvote
    Upvote(String),
    /// POST /api/articles/{name}/comments
    AddComment(String),
    /// GET on any path outside /api (front-end files, SPA fallback)
    Static(String),
    NotFound,
}

impl Route {
    pub fn resolve(method: &Method, path: &str) -> Route {
        if *method == Method::OPTIONS {
            return Route::Preflight;
        }

        if let Some(rest) = path.strip_prefix(ARTICLES_PREFIX) {
            return Self::resolve_article(method, rest);
        }

        // HEAD is answered like GET; hyper drops the body on the wire
        match (method, path) {
            (&Method::GET | &Method::HEAD, "/hello") => Route::Hello,
            (&Method::GET | &Method::HEAD, p) if !p.starts_with("/api") => {
                Route::Static(p.to_string())
            }
            _ => Route::NotFound,
        }
    }

    /// Whether the authentication gate must pass before the handler runs
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Upvote(_) | Route::AddComment(_))
    }

    fn resolve_article(method: &Method, rest: &str) -> Route {
        let segments: Vec<&str> = rest.split('/').collect();

        let name = match segments.first().and_then(|s| decode_name(s)) {
            Some(name) => name,
            None => return Route::NotFound,
        };

        match (method, &segments[1..]) {
            (&Method::GET, []) => Route::GetArticle(name),
            (&Method::POST, ["upvote"]) => Route::Upvote(name),
            (&Method::POST, ["comments"]) => Route::AddComment(name),
            _ => Route::NotFound,
        }
    }
}

/// Percent-decode an article name; empty names and names hiding a `/` are rejected
fn decode_name(segment: &str) -> Option<String> {
    let name = urlencoding::decode(segment).ok()?.into_owned();
    if name.is_empty() || name.contains('/') {
        None
    } else {
        Some(name)
    }
}

/// Message body used for every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Serialize a value as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(json) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(json)))
            .unwrap(),
        Err(_) => Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(
                r#"{"message":"Internal serialization error"}"#,
            )))
            .unwrap(),
    }
}

/// Translate an error into its documented status and public message
pub fn error_response(err: &ArticlesError) -> Response<Full<Bytes>> {
    json_response(
        err.status(),
        &ErrorResponse {
            message: err.public_message(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_routes() {
        assert_eq!(
            Route::resolve(&Method::GET, "/api/articles/learn-react"),
            Route::GetArticle("learn-react".into())
        );
        assert_eq!(
            Route::resolve(&Method::POST, "/api/articles/learn-react/upvote"),
            Route::Upvote("learn-react".into())
        );
        assert_eq!(
            Route::resolve(&Method::POST, "/api/articles/learn-react/comments"),
            Route::AddComment("learn-react".into())
        );
    }

    #[test]
    fn test_wrong_method_is_not_found() {
        assert_eq!(
            Route::resolve(&Method::GET, "/api/articles/learn-react/upvote"),
            Route::NotFound
        );
        assert_eq!(
            Route::resolve(&Method::POST, "/api/articles/learn-react"),
            Route::NotFound
        );
        assert_eq!(
            Route::resolve(&Method::DELETE, "/api/articles/learn-react"),
            Route::NotFound
        );
    }

    #[test]
    fn test_names_are_percent_decoded() {
        assert_eq!(
            Route::resolve(&Method::GET, "/api/articles/caf%C3%A9%20notes"),
            Route::GetArticle("café notes".into())
        );
        // An encoded slash must not smuggle in another path segment
        assert_eq!(
            Route::resolve(&Method::GET, "/api/articles/a%2Fb"),
            Route::NotFound
        );
        assert_eq!(Route::resolve(&Method::GET, "/api/articles/"), Route::NotFound);
    }

    #[test]
    fn test_only_mutations_require_auth() {
        assert!(Route::Upvote("a".into()).requires_auth());
        assert!(Route::AddComment("a".into()).requires_auth());
        assert!(!Route::GetArticle("a".into()).requires_auth());
        assert!(!Route::Hello.requires_auth());
        assert!(!Route::Static("/".into()).requires_auth());
        assert!(!Route::Preflight.requires_auth());
    }

    #[test]
    fn test_non_api_paths_are_static() {
        assert_eq!(Route::resolve(&Method::GET, "/hello"), Route::Hello);
        assert_eq!(
            Route::resolve(&Method::GET, "/articles/learn-react"),
            Route::Static("/articles/learn-react".into())
        );
        assert_eq!(Route::resolve(&Method::GET, "/"), Route::Static("/".into()));
        assert_eq!(Route::resolve(&Method::GET, "/api/unknown"), Route::NotFound);
        assert_eq!(Route::resolve(&Method::POST, "/hello"), Route::NotFound);
        assert_eq!(Route::resolve(&Method::HEAD, "/hello"), Route::Hello);
        assert_eq!(
            Route::resolve(&Method::HEAD, "/articles/learn-react"),
            Route::Static("/articles/learn-react".into())
        );
        assert_eq!(Route::resolve(&Method::HEAD, "/api/unknown"), Route::NotFound);
        assert_eq!(
            Route::resolve(&Method::OPTIONS, "/api/articles/x/upvote"),
            Route::Preflight
        );
    }
}
