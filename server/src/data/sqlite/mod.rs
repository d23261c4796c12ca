//! SQLite span store
//!
//! Holds at most one `SqliteConnection` with an explicit lifecycle:
//! - `connect()` opens it (no-op when already open)
//! - `disconnect()` closes it, failing if nothing was open
//! - `with_connection()` brackets a scope with connect/disconnect
//!
//! Data operations never reconnect on their own; they fail with
//! [`StoreError::NotConnected`] instead. There is no pooling and no explicit
//! transaction, so every statement auto-commits.

pub mod repositories;
pub mod schema;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::log::LevelFilter;

use super::error::StoreError;
use super::types::{IfExists, QueryOutput, ResultShape, SpanRecord, SqlValue, Table};
use crate::utils::sql::quote_identifier;

/// Builder for [`TraceStore`]
///
/// One of [`connection`](Self::connection) or [`url`](Self::url) must be
/// supplied. A supplied connection is used as-is and the store starts connected.
#[derive(Debug, Default)]
pub struct TraceStoreBuilder {
    connection: Option<SqliteConnection>,
    url: Option<String>,
}

impl TraceStoreBuilder {
    pub fn connection(mut self, connection: SqliteConnection) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<TraceStore, StoreError> {
        let options = match self.url {
            Some(url) => {
                if !url.starts_with("sqlite:") {
                    return Err(StoreError::Validation(format!(
                        "unsupported database URL '{}', expected sqlite:",
                        url
                    )));
                }
                let options = SqliteConnectOptions::from_str(&url).map_err(|e| {
                    StoreError::Validation(format!("invalid database URL '{}': {}", url, e))
                })?;
                Some(
                    options
                        .create_if_missing(true)
                        .log_statements(LevelFilter::Trace),
                )
            }
            None => None,
        };

        if options.is_none() && self.connection.is_none() {
            return Err(StoreError::Validation(
                "one of connection or url must be set".to_string(),
            ));
        }

        Ok(TraceStore {
            options,
            conn: self.connection,
        })
    }
}

/// Span table store over a single SQLite connection
#[derive(Debug)]
pub struct TraceStore {
    options: Option<SqliteConnectOptions>,
    conn: Option<SqliteConnection>,
}

impl TraceStore {
    pub fn builder() -> TraceStoreBuilder {
        TraceStoreBuilder::default()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the connection
    pub async fn connect(&mut self) -> Result<(), StoreError> {
        if self.conn.is_some() {
            tracing::trace!("Store already connected");
            return Ok(());
        }
        let options = self.options.as_ref().ok_or_else(|| {
            StoreError::Validation("no database URL configured to reconnect with".to_string())
        })?;
        let conn = options.connect().await?;
        self.conn = Some(conn);
        tracing::debug!(filename = %options.get_filename().display(), "Store connected");
        Ok(())
    }

    /// Close the connection
    pub async fn disconnect(&mut self) -> Result<(), StoreError> {
        let conn = self.conn.take().ok_or(StoreError::NotConnected)?;
        conn.close().await?;
        tracing::debug!("Store disconnected");
        Ok(())
    }

    /// Run `scope` with an open connection, closing it on every exit path
    ///
    /// The connection is opened first if needed. When both the scope and the
    /// close fail, the scope's error is returned.
    pub async fn with_connection<T, E, F>(&mut self, scope: F) -> Result<T, E>
    where
        F: AsyncFnOnce(&mut TraceStore) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.connect().await?;
        let result = scope(&mut *self).await;
        let closed = self.disconnect().await;
        match (result, closed) {
            (Err(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "Failed to close store after scope error");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    fn conn_mut(&mut self) -> Result<&mut SqliteConnection, StoreError> {
        self.conn.as_mut().ok_or(StoreError::NotConnected)
    }

    /// Create the span table if it does not exist
    pub async fn ensure_table(&mut self, table: &str) -> Result<(), StoreError> {
        let quoted = quote_table(table)?;
        repositories::spans::create_table(self.conn_mut()?, &quoted).await
    }

    /// Write rows to `table` under `policy`; returns the number of rows written
    pub async fn persist(
        &mut self,
        rows: &[SpanRecord],
        table: &str,
        policy: IfExists,
    ) -> Result<u64, StoreError> {
        let quoted = quote_table(table)?;
        repositories::spans::persist_spans(self.conn_mut()?, table, &quoted, rows, policy).await
    }

    /// Run an arbitrary statement, returning driver rows or a decoded table
    ///
    /// The statement is not validated. Parameters bind positionally to `?`.
    pub async fn query(
        &mut self,
        statement: &str,
        params: &[SqlValue],
        shape: ResultShape,
    ) -> Result<QueryOutput, StoreError> {
        let conn = self.conn_mut()?;
        match shape {
            ResultShape::Raw => Ok(QueryOutput::Raw(
                repositories::query::fetch_rows(conn, statement, params).await?,
            )),
            ResultShape::Table => Ok(QueryOutput::Table(
                repositories::query::fetch_table(conn, statement, params).await?,
            )),
        }
    }

    /// Shorthand for `query(.., ResultShape::Table)`
    pub async fn query_table(
        &mut self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Table, StoreError> {
        repositories::query::fetch_table(self.conn_mut()?, statement, params).await
    }

    /// Run a statement that returns no rows; returns rows affected
    pub async fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<u64, StoreError> {
        repositories::query::execute(self.conn_mut()?, statement, params).await
    }

    /// Full-table read in tabular form
    pub async fn read_all(&mut self, table: &str) -> Result<Table, StoreError> {
        let quoted = quote_table(table)?;
        let statement = format!("SELECT * FROM {}", quoted);
        repositories::query::fetch_table(self.conn_mut()?, &statement, &[]).await
    }

    /// Full-table read into typed span records
    pub async fn read_spans(&mut self, table: &str) -> Result<Vec<SpanRecord>, StoreError> {
        let quoted = quote_table(table)?;
        repositories::spans::select_spans(self.conn_mut()?, &quoted).await
    }
}

fn quote_table(table: &str) -> Result<String, StoreError> {
    quote_identifier(table)
        .ok_or_else(|| StoreError::Validation(format!("invalid table name '{}'", table)))
}
