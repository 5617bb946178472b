//! Authentication gate for mutating routes
//!
//! The token travels in the custom `authtoken` header, not `Authorization`.

use hyper::HeaderMap;
use tracing::warn;

use crate::auth::verifier::{CredentialVerifier, IdentityClaim};
use crate::types::{ArticlesError, Result};

/// Header carrying the raw identity provider token
pub const AUTH_HEADER: &str = "authtoken";

/// Extract the token from request headers
///
/// Missing, empty and non-ASCII values all count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller's identity or fail with a typed error
///
/// A missing token fails with `Unauthenticated` without contacting the
/// identity provider.
pub async fn authenticate(
    headers: &HeaderMap,
    verifier: &dyn CredentialVerifier,
) -> Result<IdentityClaim> {
    let token = extract_token(headers).ok_or(ArticlesError::Unauthenticated)?;

    verifier.verify(token).await.inspect_err(|e| {
        warn!(error = %e, "Credential verification failed");
    })
}
