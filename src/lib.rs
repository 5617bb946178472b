//! Articles API - upvotes and comments for articles
//!
//! A small HTTP service backing an article-reading front end. Anyone may
//! read an article's upvote count and comments; upvoting and commenting
//! require a Firebase ID token in the `authtoken` header.
//!
//! ## Modules
//!
//! - **auth**: identity provider seam and the gate for mutating routes
//! - **db**: article documents and their MongoDB / in-memory stores
//! - **routes**: route table and handlers
//! - **server**: hyper accept loop, CORS and graceful shutdown

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ArticlesError, Result};
