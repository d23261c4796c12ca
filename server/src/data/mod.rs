//! Data storage layer
//!
//! - `sqlite` - Span table store (single SQLite connection, explicit lifecycle)
//! - `types` - Row and result types shared with the domain and API layers
//! - `error` - Store error type

pub mod error;
pub mod sqlite;
pub mod types;

pub use error::StoreError;
pub use sqlite::{TraceStore, TraceStoreBuilder};
pub use types::{IfExists, QueryOutput, ResultShape, SpanRecord, SqlValue, Table};
