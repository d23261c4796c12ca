//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::core::config::AppConfig;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::domain::traces::TraceSync;

pub struct ApiServer {
    config: AppConfig,
    sync: Arc<Mutex<TraceSync>>,
}

impl ApiServer {
    /// `sync` is expected to hold a connected store; it is closed on shutdown
    pub fn new(config: AppConfig, sync: TraceSync) -> Self {
        Self {
            config,
            sync: Arc::new(Mutex::new(sync)),
        }
    }

    pub async fn start(self) -> Result<()> {
        let Self { config, sync } = self;

        let host = config.server.host.as_str();
        let port = config.server.port;
        let addr = SocketAddr::new(host.parse()?, port);

        let router = routes::router(sync.clone()).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(host, port))
                .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT)),
        );

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(address = %addr, "API server listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Shutting down");
        let mut sync = sync.lock().await;
        if let Err(e) = sync.store_mut().disconnect().await {
            tracing::warn!(error = %e, "Failed to close span store");
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

/// Origins a browser may call the API from
fn allowed_origins(host: &str, port: u16) -> Vec<String> {
    let is_loopback_or_all = matches!(host, "0.0.0.0" | "::" | "127.0.0.1" | "localhost");
    let hosts: Vec<&str> = if is_loopback_or_all {
        vec!["localhost", "127.0.0.1"]
    } else {
        vec![host]
    };
    hosts
        .iter()
        .map(|h| format!("http://{}:{}", h, port))
        .collect()
}

fn cors(host: &str, port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins(host, port)
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
}
