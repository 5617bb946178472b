//! Firebase ID token verification
//!
//! ID tokens are RS256 JWTs signed by Google. The public keys are published
//! as a JWK set; they are fetched on every verification, so a revoked or
//! rotated key takes effect immediately.
//!
//! Checks performed:
//! - header `alg` is RS256 and carries a `kid` present in the key set
//! - signature, `exp` and `iat`
//! - `aud` equals the project id
//! - `iss` equals `https://securetoken.google.com/<project id>`
//! - `sub` is non-empty

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::auth::verifier::{CredentialVerifier, IdentityClaim};
use crate::types::{ArticlesError, Result};

/// Claims read from a Firebase ID token
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Verifies Firebase ID tokens for a single project
pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    jwks_url: String,
    http_client: reqwest::Client,
}

impl FirebaseVerifier {
    pub fn new(project_id: &str, jwks_url: &str, request_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent("articles-api/0.1")
            .build()
            .map_err(|e| ArticlesError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            project_id: project_id.to_string(),
            issuer: format!("https://securetoken.google.com/{}", project_id),
            jwks_url: jwks_url.to_string(),
            http_client,
        })
    }

    /// Fetch the provider's current signing keys
    async fn fetch_keys(&self) -> Result<JwkSet> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| ArticlesError::IdentityProvider(format!("Key fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ArticlesError::IdentityProvider(format!(
                "Key endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| ArticlesError::IdentityProvider(format!("Invalid key set: {}", e)))
    }

    /// Verify a token against an already fetched key set
    pub fn verify_with_keys(&self, token: &str, keys: &JwkSet) -> Result<IdentityClaim> {
        let header = decode_header(token)
            .map_err(|e| ArticlesError::Forbidden(format!("Malformed token: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(ArticlesError::Forbidden(format!(
                "Unexpected algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| ArticlesError::Forbidden("Token has no key id".to_string()))?;

        let jwk = keys
            .find(&kid)
            .ok_or_else(|| ArticlesError::Forbidden(format!("Unknown key id {}", kid)))?;

        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| ArticlesError::IdentityProvider(format!("Unusable key {}: {}", kid, e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);

        let data = decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(|e| ArticlesError::Forbidden(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(ArticlesError::Forbidden("Empty subject".to_string()));
        }

        Ok(IdentityClaim {
            subject: data.claims.sub,
            email: data.claims.email,
            name: data.claims.name,
        })
    }
}

#[async_trait]
impl CredentialVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaim> {
        let keys = self.fetch_keys().await?;
        debug!(keys = keys.keys.len(), "Fetched identity provider keys");
        self.verify_with_keys(token, &keys)
    }
}
