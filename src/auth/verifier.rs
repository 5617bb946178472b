//! Credential verifier seam
//!
//! The router only depends on this trait, so the identity provider can be
//! swapped (Firebase in production, stubs in tests).

use async_trait::async_trait;

use crate::types::Result;

/// Verified identity of the caller, valid for one request only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    /// Stable subject identifier issued by the identity provider
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl IdentityClaim {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            name: None,
        }
    }
}

/// Validates an opaque bearer token against an identity provider
///
/// Implementations return `ArticlesError::Forbidden` when the provider
/// rejects the token and `ArticlesError::IdentityProvider` when it cannot be
/// reached. Results are never cached.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<IdentityClaim>;
}
