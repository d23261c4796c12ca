//! Trace source adapter
//!
//! Pulls raw trace documents from a Jaeger query service. One HTTP GET per
//! call, no caching and no retries; any failure surfaces as [`FetchError`].

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::RawTraceDocument;
use crate::core::constants::{
    APP_NAME, DEFAULT_LOOKBACK_MICROS, DEFAULT_TRACE_LIMIT, JAEGER_TRACES_PATH,
};
use crate::utils::time::now_micros;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid tracing backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to tracing backend failed: {0}")]
    Request(reqwest::Error),

    #[error("Tracing backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode trace document: {0}")]
    Decode(reqwest::Error),

    #[error("Tracing backend reported errors: {0}")]
    Backend(String),
}

impl FetchError {
    /// Whether the backend could not be reached at all
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

/// Optional window bounds as supplied by a caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceWindow {
    /// Microseconds since epoch; defaults to 24 hours before now
    pub start: Option<i64>,
    /// Microseconds since epoch; defaults to now
    pub end: Option<i64>,
    /// Maximum traces returned; defaults to 1000
    pub limit: Option<u32>,
}

/// Fully resolved trace search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceQuery {
    pub service: String,
    pub start: i64,
    pub end: i64,
    pub limit: u32,
}

impl TraceQuery {
    /// Resolve a window against the current time
    pub fn new(service: impl Into<String>, window: TraceWindow) -> Self {
        Self::resolve_at(service, window, now_micros())
    }

    /// Resolve a window against a fixed `now` (microseconds)
    pub fn resolve_at(service: impl Into<String>, window: TraceWindow, now: i64) -> Self {
        Self {
            service: service.into(),
            start: window.start.unwrap_or(now - DEFAULT_LOOKBACK_MICROS),
            end: window.end.unwrap_or(now),
            limit: window.limit.unwrap_or(DEFAULT_TRACE_LIMIT),
        }
    }
}

/// Anything that can produce raw trace documents
#[async_trait]
pub trait TraceSource: Send + Sync {
    async fn fetch(&self, query: &TraceQuery) -> Result<RawTraceDocument, FetchError>;
}

/// Jaeger HTTP query API client (`GET /api/traces`)
#[derive(Debug, Clone)]
pub struct JaegerSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl JaegerSource {
    /// `base_url` is the query service root, e.g. `http://localhost:16686`
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), JAEGER_TRACES_PATH);
        let endpoint = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Request)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, query: &TraceQuery) -> Result<Url, FetchError> {
        Url::parse_with_params(
            self.endpoint.as_str(),
            &[
                ("service", query.service.clone()),
                ("start", query.start.to_string()),
                ("end", query.end.to_string()),
                ("limit", query.limit.to_string()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl {
            url: self.endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl TraceSource for JaegerSource {
    async fn fetch(&self, query: &TraceQuery) -> Result<RawTraceDocument, FetchError> {
        let url = self.request_url(query)?;
        tracing::debug!(
            service = %query.service,
            start = query.start,
            end = query.end,
            limit = query.limit,
            "Fetching traces"
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: RawTraceDocument = response.json().await.map_err(FetchError::Decode)?;
        if !document.errors.is_empty() {
            let messages: Vec<String> = document
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.msg, e.code))
                .collect();
            return Err(FetchError::Backend(messages.join("; ")));
        }

        tracing::debug!(traces = document.data.len(), "Fetched traces");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn query() -> TraceQuery {
        TraceQuery {
            service: "agent.traces".to_string(),
            start: 100,
            end: 200,
            limit: 5,
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let now = 1_750_618_321_000_000;
        let q = TraceQuery::resolve_at("svc", TraceWindow::default(), now);
        assert_eq!(q.end, now);
        assert_eq!(q.start, now - 86_400_000_000);
        assert_eq!(q.limit, 1000);
    }

    #[test]
    fn test_resolve_explicit_values_kept() {
        let window = TraceWindow {
            start: Some(1),
            end: Some(2),
            limit: Some(3),
        };
        let q = TraceQuery::resolve_at("svc", window, 999);
        assert_eq!((q.start, q.end, q.limit), (1, 2, 3));
    }

    #[test]
    fn test_resolve_bounds_default_independently() {
        let window = TraceWindow {
            end: Some(50),
            ..Default::default()
        };
        let q = TraceQuery::resolve_at("svc", window, 1_000_000_000_000);
        assert_eq!(q.end, 50);
        assert_eq!(q.start, 1_000_000_000_000 - DEFAULT_LOOKBACK_MICROS);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let source = JaegerSource::new("http://jaeger.local/jaeger/").unwrap();
        assert_eq!(
            source.endpoint().as_str(),
            "http://jaeger.local/jaeger/api/traces"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = JaegerSource::new("not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_fetch_sends_query_params() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/traces")
                    .query_param("service", "agent.traces")
                    .query_param("start", "100")
                    .query_param("end", "200")
                    .query_param("limit", "5");
                then.status(200).json_body(json!({
                    "data": [{
                        "traceID": "abc123",
                        "processes": {"p1": {"serviceName": "service-a"}},
                        "spans": [{"spanID": "span1", "operationName": "op",
                                   "startTime": 1, "duration": 2, "processID": "p1"}]
                    }],
                    "total": 0, "limit": 0, "offset": 0, "errors": null
                }));
            })
            .await;

        let source = JaegerSource::new(&server.base_url()).unwrap();
        let document = source.fetch(&query()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(document.data.len(), 1);
        assert_eq!(document.data[0].trace_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/traces");
                then.status(500).body("boom");
            })
            .await;

        let source = JaegerSource::new(&server.base_url()).unwrap();
        let err = source.fetch(&query()).await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_backend_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/traces");
                then.status(200).json_body(json!({
                    "data": null,
                    "errors": [{"code": 400, "msg": "bad window"}]
                }));
            })
            .await;

        let source = JaegerSource::new(&server.base_url()).unwrap();
        let err = source.fetch(&query()).await.unwrap_err();
        assert!(matches!(err, FetchError::Backend(ref m) if m == "bad window (400)"));
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/traces");
                then.status(200).body("not json");
            })
            .await;

        let source = JaegerSource::new(&server.base_url()).unwrap();
        let err = source.fetch(&query()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_backend() {
        let source = JaegerSource::new("http://127.0.0.1:1").unwrap();
        let err = source.fetch(&query()).await.unwrap_err();
        assert!(err.is_connection());
    }
}
