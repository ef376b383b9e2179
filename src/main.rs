use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptduel::{config::ServerConfig, router, AppState};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptduel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting promptduel...");

    let config = ServerConfig::from_env();
    let catalog = match config.load_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    if catalog.is_empty() {
        tracing::warn!("Prompt catalog is empty, no match will be able to start");
    }
    tracing::info!(
        "Sessions: {} participants, first to {} points, {} prompts",
        config.session.max_participants,
        config.session.max_points,
        catalog.len()
    );

    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(config, catalog));
    let app = router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
