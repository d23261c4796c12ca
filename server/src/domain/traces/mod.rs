//! Trace ingestion
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ 1. FETCH     │──▶│ 2. FLATTEN    │──▶│ 3. PERSIST   │
//! │ Jaeger HTTP  │   │ trace → span  │   │ SQLite table │
//! │ query API    │   │ → SpanRecord  │   │ (if_exists)  │
//! └──────────────┘   └───────────────┘   └──────────────┘
//! ```
//!
//! - `model` - Jaeger query API document types
//! - `source` - Stage 1: fetch raw documents from the tracing backend
//! - `flatten` - Stage 2: nested traces to flat span rows
//! - `sync` - Orchestrates the three stages into one call

mod flatten;
mod model;
mod source;
mod sync;

pub use flatten::{FlattenError, flatten};
pub use model::{RawApiError, RawProcess, RawReference, RawSpan, RawTag, RawTrace, RawTraceDocument};
pub use source::{FetchError, JaegerSource, TraceQuery, TraceSource, TraceWindow};
pub use sync::{SyncError, SyncReport, SyncWindow, TraceSync};
