use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use axum_classify::{
    build_router,
    config::{Config, StorageBackend},
    services::{
        AccountStore, AdminSecret, ImageFetcher, InMemoryStore, LabelIndex, RedisService,
        RemoteClassifier,
    },
    AppState, ServiceSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("axum_classify=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let store = build_store(&config).await?;

    // The label file and model endpoint are fixed for the process lifetime
    let labels = LabelIndex::load(&config.classifier.labels_path)
        .await
        .context("Failed to load class labels")?;
    let classifier = RemoteClassifier::new(
        config.classifier.endpoint.clone(),
        labels,
        config.classifier.top_k,
        config.classifier.timeout(),
    )
    .context("Failed to build classifier client")?;

    let fetcher = ImageFetcher::new(config.fetch.timeout(), config.fetch.max_image_bytes)
        .context("Failed to build image fetcher")?;

    // validate() guarantees the secret is present
    let admin_secret = AdminSecret::new(config.admin.secret.clone().unwrap_or_default());

    let state = AppState::new(
        store,
        Arc::new(classifier),
        fetcher,
        admin_secret,
        ServiceSettings::from_config(&config),
    );
    let app = build_router(state, config.upload.max_file_size);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on {}", address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn AccountStore>> {
    match config.storage.backend {
        StorageBackend::Redis => {
            let client = redis::Client::open(config.redis_url())
                .context("Invalid Redis URL")?;
            let service = RedisService::connect(client)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Using Redis account store");
            Ok(Arc::new(service))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory account store, accounts are lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
