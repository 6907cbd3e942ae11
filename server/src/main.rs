use std::net::SocketAddr;
use std::sync::Arc;

use garage_auth::clock::SystemClock;
use garage_auth::config::ServerConfig;
use garage_auth::http::{AppState, router};
use garage_auth::store::MemoryUserStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "garage_auth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: listen_port={}, token_ttl_secs={}, hash_cost={}",
        config.listen_port,
        config.token.ttl_secs(),
        config.hasher.cost()
    );

    // Credentials live in memory until a database-backed store replaces this one.
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::from_config(&config, store, Arc::new(SystemClock));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
