//! API route handlers

pub mod health;
pub mod traces;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::sync::Mutex;

use crate::domain::traces::TraceSync;

/// Build the full API router around a shared sync facade
pub fn router(sync: Arc<Mutex<TraceSync>>) -> Router<()> {
    Router::new()
        .route("/api/v1/health", get(health::health))
        .nest("/api/v1", traces::routes(sync))
}
