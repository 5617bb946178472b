//! Articles API server

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use articles_api::{
    auth::{CredentialVerifier, FirebaseVerifier},
    config::{Args, ServiceAccount},
    db::{ArticleStore, MemoryArticleStore, MongoArticleStore, MongoClient},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("articles_api={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Articles API");
    info!("======================================");
    info!("Port: {}", args.port);
    if args.memory_store {
        info!("Store: in-memory");
    } else {
        info!("Store: {}", args.mongodb.redacted_target());
    }
    info!("Front end: {}", args.dist_dir.display());
    info!("CORS origin: {}", args.cors_origin);
    info!("======================================");

    // The identity provider must be configured before accepting requests
    let account = match ServiceAccount::load(&args.credentials_path) {
        Ok(account) => account,
        Err(e) => {
            error!("Failed to load service account: {}", e);
            std::process::exit(1);
        }
    };
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(FirebaseVerifier::new(
        &account.project_id,
        &args.jwks_url,
        Duration::from_millis(args.request_timeout_ms),
    )?);
    info!(
        "Identity provider configured for project {} (service account: {})",
        account.project_id,
        account.client_email.as_deref().unwrap_or("unknown")
    );

    // Connect to the store before the listener opens
    let store: Arc<dyn ArticleStore> = if args.memory_store {
        Arc::new(MemoryArticleStore::new())
    } else {
        let client = match MongoClient::connect(&args.mongodb.uri(), &args.mongodb.mongodb_db).await {
            Ok(client) => client,
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        };
        info!("MongoDB connected successfully (database: {})", client.db_name());
        Arc::new(MongoArticleStore::new(client).await?)
    };

    let state = Arc::new(AppState::new(args, store, verifier));

    server::run(state).await?;

    info!("Articles API stopped");
    Ok(())
}
