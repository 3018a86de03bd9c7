//! Request logging middleware.
//!
//! Logs every HTTP request with method, path, status code, and latency.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Middleware that logs HTTP requests with timing information.
///
/// Logs at INFO level for successful and client-error requests, WARN level
/// for server errors. Health checks are skipped.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Skip logging for health checks to reduce noise
    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();

    let response = next.run(request).await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    macro_rules! log_request {
        ($level:ident, $message:literal) => {
            $level!(
                method = %method,
                path = %path,
                status = status,
                latency_ms = latency_ms,
                $message
            )
        };
    }

    match status {
        500.. => log_request!(warn, "Request failed (5xx)"),
        400..=499 => log_request!(info, "Request completed (4xx)"),
        _ => log_request!(info, "Request completed"),
    }

    response
}
