//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, timeout, tracing)
//! - Build the shared outbound platform client
//! - Bind server to listener with graceful shutdown

use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::compiler::CompileOptions;
use crate::config::ServiceConfig;
use crate::http::handlers;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared outbound client; the credential is attached per call.
    pub client: reqwest::Client,
    pub api_base_url: Url,
    pub compile_options: CompileOptions,
}

impl AppState {
    pub fn new(client: reqwest::Client, api_base_url: Url, compile_options: CompileOptions) -> Self {
        Self {
            client,
            api_base_url,
            compile_options,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .timeout(config.platform.request_timeout())
            .user_agent(concat!("edge-migrator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let api_base_url = Url::parse(&config.platform.api_base_url)?;
        Ok(Self::new(client, api_base_url, config.compiler.options()))
    }
}

/// Errors building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build platform client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid platform API URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the migration service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(config)?;
        Ok(Self {
            router: Self::build_router(config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/cloudfront/service/{service_id}", post(handlers::deploy))
            .route("/cloudfront/service/{service_id}/compile", post(handlers::compile))
            .fallback(handlers::not_found)
            .method_not_allowed_fallback(handlers::not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
