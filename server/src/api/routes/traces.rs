//! Span table endpoints
//!
//! All handlers share one `TraceSync` behind a mutex, so requests touching
//! the store run one at a time.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::data::{IfExists, SqlValue, Table};
use crate::domain::traces::{SyncReport, SyncWindow, TraceSync};

/// Shared state for span table endpoints
#[derive(Clone)]
pub struct TracesApiState {
    pub sync: Arc<Mutex<TraceSync>>,
}

/// Build span table routes
pub fn routes(sync: Arc<Mutex<TraceSync>>) -> Router<()> {
    let state = TracesApiState { sync };

    Router::new()
        .route("/spans", get(list_spans))
        .route("/query", post(run_query))
        .route("/sync", post(sync_traces))
        .with_state(state)
}

/// Request body for `POST /query`
#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1, message = "sql must not be empty"))]
    pub sql: String,
    #[serde(default)]
    pub params: Vec<SqlValue>,
}

/// Request body for `POST /sync`; every field is optional
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SyncRequest {
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u32>,
    pub if_exists: Option<IfExists>,
}

impl From<SyncRequest> for SyncWindow {
    fn from(request: SyncRequest) -> Self {
        Self {
            start: request.start,
            end: request.end,
            limit: request.limit,
            if_exists: request.if_exists,
        }
    }
}

/// Return the whole span table
pub async fn list_spans(State(state): State<TracesApiState>) -> Result<Json<Table>, ApiError> {
    let mut sync = state.sync.lock().await;
    let table = sync.read_all().await?;
    Ok(Json(table))
}

/// Run a SQL statement against the store and return the tabular result
pub async fn run_query(
    State(state): State<TracesApiState>,
    ValidatedJson(request): ValidatedJson<QueryRequest>,
) -> Result<Json<Table>, ApiError> {
    let mut sync = state.sync.lock().await;
    let table = sync
        .store_mut()
        .query_table(&request.sql, &request.params)
        .await?;
    tracing::debug!(rows = table.len(), "Query executed");
    Ok(Json(table))
}

/// Pull a window of traces into the span table
pub async fn sync_traces(
    State(state): State<TracesApiState>,
    ValidatedJson(request): ValidatedJson<SyncRequest>,
) -> Result<Json<SyncReport>, ApiError> {
    let mut sync = state.sync.lock().await;
    let report = sync.sync_window(request.into()).await?;
    Ok(Json(report))
}
