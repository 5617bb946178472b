//! Authentication for mutating requests
//!
//! Provides:
//! - `CredentialVerifier`: seam over the external identity provider
//! - `FirebaseVerifier`: Firebase ID token verification against Google's keys
//! - `authenticate`: the gate run before every mutating route

pub mod firebase;
pub mod gate;
pub mod verifier;

pub use firebase::FirebaseVerifier;
pub use gate::{authenticate, extract_token, AUTH_HEADER};
pub use verifier::{CredentialVerifier, IdentityClaim};
