//! Request-context middleware.
//!
//! For every inbound request this layer:
//! - resolves the correlation id (inbound `X-Request-ID` if present and
//!   non-blank after trimming, else a fresh UUID)
//! - runs the rest of the stack inside the task-local id scope so services
//!   and logs can read it without parameter threading
//! - measures end-to-end wall time (distinct from the provider-only latency
//!   inside response bodies)
//! - sets `X-Request-ID` and `X-Response-Time-ms` on every response
use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info};
use uuid::Uuid;

use crate::context;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const RESPONSE_TIME_HEADER: &str = "x-response-time-ms";

pub async fn request_context(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    // The scope is torn down when the future completes, even if the handler
    // short-circuits, so concurrent requests never observe each other's id.
    let mut response = context::scope(request_id.clone(), next.run(req)).await;

    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{latency_ms:.2}")) {
        response.headers_mut().insert(RESPONSE_TIME_HEADER, value);
    }

    let status = response.status().as_u16();
    if response.status().is_server_error() {
        error!(
            %method,
            %path,
            status,
            latency_ms = (latency_ms * 100.0).round() / 100.0,
            request_id = %request_id,
            "request failed"
        );
    } else {
        info!(
            %method,
            %path,
            status,
            latency_ms = (latency_ms * 100.0).round() / 100.0,
            request_id = %request_id,
            "request completed"
        );
    }

    response
}
