//! Service middleware for metrics, access control and request tracking.
//!
//! ## Metrics Logged
//!
//! - `request`: path pattern, method, status, latency
//! - `registration`: merge outcome of each registration
//! - `upload`: stored object kind and size

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex_lite::Regex;
use tracing::{info, warn};

use super::state::ServiceState;
use crate::auth;
use crate::roster::MergeOutcome;
use crate::store::ObjectStore;

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing; an aggregator can derive counters and histograms from the
/// `reunion_board::metrics` target.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "reunion_board::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

fn path_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                r"^/api/participant-photos/[^/]+/[^/]+",
                "/api/participant-photos/:participantName/:photoName",
            ),
            (r"^/api/photos/[^/]+", "/api/photos/:photoName"),
            (r"^/admin/photos/[^/]+", "/admin/photos/:photoName"),
            (r"^/admin/init/[^/]+", "/admin/init/:name"),
            (r"^/assets/.+", "/assets/*"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).expect("static path pattern"), replacement))
        .collect()
    })
}

/// Normalize a path for metrics to avoid high cardinality.
///
/// Photo names, participant folders and blob names become placeholders.
pub fn normalize_path(path: &str) -> String {
    for (regex, replacement) in path_patterns() {
        if regex.is_match(path) {
            return regex.replace(path, *replacement).into_owned();
        }
    }
    path.to_string()
}

/// Basic-auth guard for the index page.
///
/// Credentials are compared with `db/auth.json` on every request. Without a
/// stored configuration every request is refused.
pub async fn basic_auth<S: ObjectStore + 'static>(
    State(state): State<ServiceState<S>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(auth::parse_basic);

    let expected = match state.board.auth_config().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Could not load auth config");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match (expected, presented) {
        (Some(expected), Some(presented)) if expected.accepts(&presented) => next.run(request).await,
        (expected, _) => {
            if expected.is_none() {
                warn!("No auth config stored, refusing index request");
            }
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, auth::challenge())],
                "Unauthorized",
            )
                .into_response()
        }
    }
}

/// Record a registration outcome.
pub fn record_registration(outcome: &MergeOutcome) {
    let result = match outcome {
        MergeOutcome::Inserted => "inserted",
        MergeOutcome::Updated => "updated",
        MergeOutcome::Rejected(_) => "rejected",
    };
    info!(
        target: "reunion_board::metrics",
        metric_type = "registration",
        result = result,
        "registration_metric"
    );
}

/// Record a stored upload.
pub fn record_upload(kind: &str, bytes: usize) {
    info!(
        target: "reunion_board::metrics",
        metric_type = "upload",
        kind = kind,
        bytes = bytes as u64,
        "upload_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_collapses_photo_names() {
        assert_eq!(normalize_path("/api/photos/1699-beach.jpg"), "/api/photos/:photoName");
        assert_eq!(
            normalize_path("/api/photos/1699-beach.jpg/comments"),
            "/api/photos/:photoName/comments"
        );
        assert_eq!(normalize_path("/admin/photos/x.jpg"), "/admin/photos/:photoName");
    }

    #[test]
    fn test_normalize_path_collapses_participant_folders() {
        assert_eq!(
            normalize_path("/api/participant-photos/DOE_JOHN/profilePhoto1998"),
            "/api/participant-photos/:participantName/:photoName"
        );
        assert_eq!(normalize_path("/admin/init/auth"), "/admin/init/:name");
        assert_eq!(normalize_path("/assets/css/site.css"), "/assets/*");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/api/photos"), "/api/photos");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }
}
