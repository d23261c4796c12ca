// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "TraceTable";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tracetable";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".tracetable";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tracetable.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TRACETABLE_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TRACETABLE_LOG";

// =============================================================================
// Environment Variables - Tracing Backend
// =============================================================================

/// Environment variable for the Jaeger query base URL
pub const ENV_TRACING_URL: &str = "TRACETABLE_TRACING_URL";

/// Environment variable for the service whose traces are pulled
pub const ENV_TRACING_SERVICE: &str = "TRACETABLE_SERVICE";

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Environment variable for the SQLite connection URL
pub const ENV_DATABASE_URL: &str = "TRACETABLE_DATABASE_URL";

/// Environment variable for the span table name
pub const ENV_TABLE: &str = "TRACETABLE_TABLE";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "TRACETABLE_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "TRACETABLE_PORT";

// =============================================================================
// Defaults
// =============================================================================

/// Default Jaeger query service URL
pub const DEFAULT_TRACING_URL: &str = "http://localhost:16686";

/// Path of the Jaeger traces search endpoint
pub const JAEGER_TRACES_PATH: &str = "/api/traces";

/// Default span table name
pub const DEFAULT_TABLE: &str = "otel_traces";

/// Default maximum number of traces per fetch
pub const DEFAULT_TRACE_LIMIT: u32 = 1000;

/// Default lookback when no window start is given (24 hours, microseconds)
pub const DEFAULT_LOOKBACK_MICROS: i64 = 24 * 60 * 60 * 1_000_000;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

// =============================================================================
// Storage
// =============================================================================

/// Rows per multi-row INSERT statement (8 binds per row stays well under
/// SQLite's host parameter limit)
pub const INSERT_BATCH_ROWS: usize = 500;

/// Longest accepted table identifier
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Tag key carrying the OpenTelemetry span status
pub const STATUS_CODE_TAG: &str = "otel.status_code";

// =============================================================================
// API
// =============================================================================

/// Request body size limit for the query and sync endpoints
pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024;
