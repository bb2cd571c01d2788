use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ly_fantasy::build_router;
use ly_fantasy::config::AppConfig;
use ly_fantasy::database::connection::connect_store;
use ly_fantasy::services::http_fetch::HttpFetcher;
use ly_fantasy::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => {
            tracing::info!("✅ App config loaded");
            config
        }
        Err(e) => {
            tracing::error!("❌ Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET is not set; cron triggers will refuse every request");
    }

    let store = match connect_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    let fetcher = match HttpFetcher::new(config.fetch) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!("❌ Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr();
    let state = AppState::new(Arc::new(store), config, fetcher);
    let app = build_router(state);

    tracing::info!("🚀 Server starting on {}", addr);

    match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}
