//! Reunion Board Service Binary
//!
//! Runs the board as a REST API service:
//! - Structured JSON logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables:
//! - `STORAGE_BACKEND`: `memory` or `s3` (default: memory)
//! - `S3_BUCKET`, `S3_PREFIX`: S3 location (backend `s3`, feature `s3`)
//! - `PORT`: Service port (default: 3000)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! Board settings (`ROSTER_CAPACITY`, `WRITE_MODE`, ...) are listed in
//! [`reunion_board::config`].
//!
//! ## Usage
//!
//! ```bash
//! STORAGE_BACKEND=s3 S3_BUCKET=reunion cargo run --bin reunion_board --features s3
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use reunion_board::config::{BoardConfig, ServiceConfig, StorageBackend};
use reunion_board::service::{create_router, metrics_middleware, ServiceState};
use reunion_board::store::{InMemoryObjectStore, ObjectStore};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reunion_board=info,tower_http=info,aws_config=warn".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

/// Request logging middleware that adds a correlation ID and timing
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        target: "reunion_board::access",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

/// Compose the router with the service middleware stack.
fn build_app<S: ObjectStore + 'static>(state: ServiceState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(feature = "s3")]
async fn s3_app(board: BoardConfig, config: ServiceConfig) -> Result<Router, Box<dyn std::error::Error>> {
    let store = reunion_board::store::S3ObjectStore::from_env().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to configure S3 store");
        e
    })?;
    Ok(build_app(ServiceState::new(store, board, config)))
}

#[cfg(not(feature = "s3"))]
async fn s3_app(_board: BoardConfig, _config: ServiceConfig) -> Result<Router, Box<dyn std::error::Error>> {
    tracing::error!("STORAGE_BACKEND=s3 requires the `s3` feature");
    Err("binary built without the `s3` feature".into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(version = version, build_sha = build_sha, "Starting Reunion Board Service");

    let config = ServiceConfig::from_env()?;
    let board = BoardConfig::from_env();
    info!(
        backend = ?config.backend,
        roster_capacity = board.roster_capacity,
        photo_cap = board.photo_cap,
        write_mode = ?board.write_mode,
        "Configuration loaded"
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let app = match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            build_app(ServiceState::new(InMemoryObjectStore::new(), board, config))
        }
        StorageBackend::S3 => s3_app(board, config).await?,
    };

    info!(address = %addr, version = version, "Reunion Board Service listening");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
            _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
        }
    };

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Reunion Board Service shutdown complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        build_app(ServiceState::new(
            InMemoryObjectStore::new(),
            BoardConfig::default(),
            ServiceConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_layered_app_echoes_request_id() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/health/live")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "req-42");
    }

    #[tokio::test]
    async fn test_layered_app_answers_cors_preflight() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .method("OPTIONS")
                    .uri("/api/participants")
                    .header(header::ORIGIN, "http://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }
}
