//! Configuration for the articles service
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::types::{ArticlesError, Result};

/// Default Google endpoint publishing the keys that sign Firebase ID tokens
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Articles API - upvotes and comments for articles
#[derive(Parser, Debug, Clone)]
#[command(name = "articles-api")]
#[command(about = "Article upvotes and comments backed by MongoDB")]
pub struct Args {
    /// Port to listen on (binds all interfaces)
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// MongoDB store configuration
    #[command(flatten)]
    pub mongodb: MongoArgs,

    /// Path to the identity provider service-account JSON
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", default_value = "./credentials.json")]
    pub credentials_path: PathBuf,

    /// JWK set URL used to verify ID tokens
    #[arg(long, env = "FIREBASE_JWKS_URL", default_value = FIREBASE_JWKS_URL)]
    pub jwks_url: String,

    /// Single origin allowed by CORS (credentials are permitted)
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:5173")]
    pub cors_origin: String,

    /// Directory holding the built front end
    #[arg(long, env = "DIST_DIR", default_value = "../dist")]
    pub dist_dir: PathBuf,

    /// Timeout for identity provider requests in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "5000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Keep articles in process memory instead of MongoDB (local development)
    #[arg(long, env = "MEMORY_STORE", default_value = "false")]
    pub memory_store: bool,
}

/// MongoDB connection configuration
#[derive(Parser, Debug, Clone)]
pub struct MongoArgs {
    /// Username for the remote cluster; when unset the local URI is used
    #[arg(long, env = "MONGODB_USERNAME")]
    pub mongodb_username: Option<String>,

    /// Password for the remote cluster
    #[arg(long, env = "MONGODB_PASSWORD")]
    pub mongodb_password: Option<String>,

    /// Remote cluster SRV host
    #[arg(
        long,
        env = "MONGODB_HOST",
        default_value = "full-stack-react-server.ukvlefk.mongodb.net"
    )]
    pub mongodb_host: String,

    /// Local MongoDB URI
    #[arg(long, env = "MONGODB_LOCAL_URI", default_value = "mongodb://127.0.0.1:27017")]
    pub mongodb_local_uri: String,

    /// Database name
    #[arg(long, env = "MONGODB_DB", default_value = "full-stack-react-db")]
    pub mongodb_db: String,
}

impl MongoArgs {
    /// Whether the credentialed remote cluster is targeted
    pub fn is_remote(&self) -> bool {
        self.mongodb_username.is_some()
    }

    /// Connection URI for the configured target
    pub fn uri(&self) -> String {
        match &self.mongodb_username {
            Some(user) => format!(
                "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority&appName=full-stack-react-server",
                urlencoding::encode(user),
                urlencoding::encode(self.mongodb_password.as_deref().unwrap_or("")),
                self.mongodb_host
            ),
            None => self.mongodb_local_uri.clone(),
        }
    }

    /// Connection target safe for logging (no credentials)
    pub fn redacted_target(&self) -> String {
        if self.is_remote() {
            format!("mongodb+srv://***@{}", self.mongodb_host)
        } else {
            self.mongodb_local_uri.clone()
        }
    }
}

impl Args {
    /// Socket address to bind
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.mongodb.mongodb_username.is_some() && self.mongodb.mongodb_password.is_none() {
            return Err("MONGODB_PASSWORD is required when MONGODB_USERNAME is set".to_string());
        }

        if self.cors_origin.trim().is_empty() {
            return Err("CORS_ORIGIN must not be empty".to_string());
        }

        Ok(())
    }
}

/// Identity provider service-account credentials
///
/// Only the fields needed for token verification are read; the rest of the
/// file (private key etc.) is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

impl ServiceAccount {
    /// Load and parse a service-account JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ArticlesError::Config(format!("Failed to read credentials {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let account: ServiceAccount = serde_json::from_str(raw)
            .map_err(|e| ArticlesError::Config(format!("Invalid credentials file: {}", e)))?;

        if account.project_id.trim().is_empty() {
            return Err(ArticlesError::Config(
                "Credentials file has an empty project_id".to_string(),
            ));
        }

        Ok(account)
    }
}
