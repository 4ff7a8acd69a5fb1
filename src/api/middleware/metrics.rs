use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Logs one `request_completed` line per request under the `metrics` target.
/// Server errors are logged at warn level.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(target: "metrics", %method, %path, status, latency_ms, "request_completed");
    } else {
        info!(target: "metrics", %method, %path, status, latency_ms, "request_completed");
    }

    response
}
