//! HTTP API endpoints.
//!
//! Read-only views for collaborators that poll instead of holding a socket.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::state::AppState;

/// Current snapshot of one session.
///
/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.snapshot(&id).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (StatusCode::NOT_FOUND, format!("Unknown session {}", id)).into_response(),
    }
}
