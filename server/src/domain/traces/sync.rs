//! Fetch → flatten → persist in one call

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::flatten::{FlattenError, flatten};
use super::source::{FetchError, JaegerSource, TraceQuery, TraceSource, TraceWindow};
use crate::core::constants::DEFAULT_TRACE_LIMIT;
use crate::data::{IfExists, StoreError, Table, TraceStore};
use crate::utils::time::micros_to_iso;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parameters of one sync call; every field is optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub limit: Option<u32>,
    pub if_exists: Option<IfExists>,
}

impl SyncWindow {
    pub fn trace_window(&self) -> TraceWindow {
        TraceWindow {
            start: self.start,
            end: self.end,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Traces returned by the source
    pub traces: usize,
    /// Rows written to the table
    pub rows: u64,
}

/// Sync facade over a trace source and a span store
///
/// Calls run strictly in sequence and are not idempotent: syncing an
/// overlapping window under `append` writes the same spans again.
pub struct TraceSync<S = JaegerSource> {
    source: S,
    store: TraceStore,
    service: String,
    table: String,
    default_limit: u32,
}

impl<S: TraceSource> TraceSync<S> {
    pub fn new(
        source: S,
        store: TraceStore,
        service: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            service: service.into(),
            table: table.into(),
            default_limit: DEFAULT_TRACE_LIMIT,
        }
    }

    /// Trace limit used when a window does not name one
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn store_mut(&mut self) -> &mut TraceStore {
        &mut self.store
    }

    /// Pull one window of traces, flatten it, and persist the rows
    ///
    /// Any stage failing aborts the call. Rows already written by earlier
    /// insert batches are not rolled back.
    pub async fn sync_window(&mut self, window: SyncWindow) -> Result<SyncReport, SyncError> {
        let mut trace_window = window.trace_window();
        trace_window.limit = trace_window.limit.or(Some(self.default_limit));
        let query = TraceQuery::new(self.service.as_str(), trace_window);
        let document = self.source.fetch(&query).await?;
        let rows = flatten(&document)?;
        let policy = window.if_exists.unwrap_or_default();
        let written = self.store.persist(&rows, &self.table, policy).await?;

        let report = SyncReport {
            traces: document.data.len(),
            rows: written,
        };
        tracing::info!(
            service = %self.service,
            table = %self.table,
            from = %micros_to_iso(query.start),
            to = %micros_to_iso(query.end),
            traces = report.traces,
            rows = report.rows,
            policy = %policy,
            "Synced traces"
        );
        Ok(report)
    }

    /// Open the store, sync one window and close the store again
    ///
    /// The store is closed on every exit path. When both the sync and the
    /// close fail, the sync error is returned.
    pub async fn sync_connected(&mut self, window: SyncWindow) -> Result<SyncReport, SyncError> {
        self.store.connect().await?;
        let result = self.sync_window(window).await;
        let closed = self.store.disconnect().await;
        match (result, closed) {
            (Err(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "Failed to close store after sync error");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Ok(report), Ok(())) => Ok(report),
        }
    }

    /// Full read of the configured table
    pub async fn read_all(&mut self) -> Result<Table, StoreError> {
        self.store.read_all(&self.table).await
    }
}
