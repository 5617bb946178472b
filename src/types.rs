//! Shared error type for the articles service

use hyper::StatusCode;
use thiserror::Error;

/// Errors raised anywhere in the service.
///
/// Every variant maps onto exactly one HTTP status via [`ArticlesError::status`].
/// The message returned to clients comes from [`ArticlesError::public_message`];
/// the `Display` text may contain internal detail and is only logged.
#[derive(Debug, Error)]
pub enum ArticlesError {
    /// Mutating request without a credential header
    #[error("missing auth token")]
    Unauthenticated,

    /// Credential present but rejected by the identity provider
    #[error("invalid credential: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request body over the accepted size (limit in bytes)
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Document store failure (unreachable, command error, decode error)
    #[error("database error: {0}")]
    Database(String),

    /// Identity provider unreachable or returned an unusable key set
    #[error("identity provider error: {0}")]
    IdentityProvider(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ArticlesError {
    /// HTTP status for this error kind
    pub fn status(&self) -> StatusCode {
        match self {
            ArticlesError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ArticlesError::Forbidden(_) => StatusCode::FORBIDDEN,
            ArticlesError::NotFound(_) => StatusCode::NOT_FOUND,
            ArticlesError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ArticlesError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ArticlesError::Database(_) | ArticlesError::IdentityProvider(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ArticlesError::Config(_) | ArticlesError::Io(_) | ArticlesError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message; never includes upstream error text
    pub fn public_message(&self) -> String {
        match self {
            ArticlesError::Unauthenticated => "Missing auth token".to_string(),
            ArticlesError::Forbidden(_) => "Invalid or expired token".to_string(),
            ArticlesError::NotFound(what) => format!("Not found: {}", what),
            ArticlesError::BadRequest(msg) => msg.clone(),
            ArticlesError::PayloadTooLarge(_) => "Request body too large".to_string(),
            ArticlesError::Database(_) | ArticlesError::IdentityProvider(_) => {
                "Upstream service unavailable".to_string()
            }
            ArticlesError::Config(_) | ArticlesError::Io(_) | ArticlesError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl From<mongodb::error::Error> for ArticlesError {
    fn from(e: mongodb::error::Error) -> Self {
        ArticlesError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ArticlesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ArticlesError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ArticlesError::Forbidden("expired".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ArticlesError::NotFound("/api/nope".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ArticlesError::PayloadTooLarge(1024).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ArticlesError::Database("connection reset".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ArticlesError::IdentityProvider("timeout".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ArticlesError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_upstream_detail() {
        let err = ArticlesError::Database("E11000 duplicate key on 10.0.0.3".into());
        assert_eq!(err.public_message(), "Upstream service unavailable");
        assert!(!err.public_message().contains("10.0.0.3"));

        let err = ArticlesError::Forbidden("InvalidSignature".into());
        assert_eq!(err.public_message(), "Invalid or expired token");
    }
}
