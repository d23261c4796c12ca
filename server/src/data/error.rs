//! Store error types

use thiserror::Error;

/// Errors raised by the span table store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed construction arguments or identifiers
    #[error("Invalid store configuration: {0}")]
    Validation(String),

    /// Operation attempted without an open connection
    #[error("Store is not connected")]
    NotConnected,

    /// `fail` policy hit an existing table that already holds rows
    #[error("Table {table} already exists and contains {rows} rows")]
    TableNotEmpty { table: String, rows: i64 },

    /// Database unreachable or the connection broke
    #[error("Connection error: {0}")]
    Connection(sqlx::Error),

    /// Statement rejected by the driver (syntax, schema mismatch, decode)
    #[error("Query error: {0}")]
    Query(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err),
            other => Self::Query(other),
        }
    }
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_is_connection() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: StoreError = sqlx::Error::Io(io_err).into();
        assert!(matches!(err, StoreError::Connection(_)));
        assert!(err.is_connection());
    }

    #[test]
    fn test_row_not_found_is_query() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(!err.is_connection());
    }

    #[test]
    fn test_table_not_empty_display() {
        let err = StoreError::TableNotEmpty {
            table: "otel_traces".to_string(),
            rows: 3,
        };
        assert_eq!(
            err.to_string(),
            "Table otel_traces already exists and contains 3 rows"
        );
    }
}
