// Public API for integration tests and potential library usage

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod state;
pub mod types;
pub mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the HTTP/WebSocket router around shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/sessions/{id}", get(api::get_session))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub use session::{Session, SessionSnapshot};
pub use state::AppState;
