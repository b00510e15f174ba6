//! Application error taxonomy with an HTTP-safe shape.
//!
//! Every failure that crosses the provider boundary is classified into one of
//! a small set of kinds, each carrying a fixed status code, a stable machine
//! code, and a retryable flag. Vendor-specific details never leak to callers.
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The closed set of upstream-failure kinds surfaced by the gateway.
///
/// The `code` values are stable across releases; clients may branch on them.
/// The `retryable` flag tells callers whether re-issuing the same request is
/// safe without inspecting the specific code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider call exceeded the configured timeout.
    UpstreamTimeout,
    /// The provider reported rate limiting.
    UpstreamRateLimited,
    /// Connection failure, or the provider reported a 5xx status.
    UpstreamUnavailable,
    /// Any other provider error status, malformed response, or unclassified
    /// failure during the call.
    BadUpstreamResponse,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::BadUpstreamResponse => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ErrorKind::UpstreamRateLimited => "UPSTREAM_RATE_LIMITED",
            ErrorKind::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorKind::BadUpstreamResponse => "BAD_UPSTREAM_RESPONSE",
        }
    }

    /// All four kinds describe transient upstream conditions.
    pub fn retryable(self) -> bool {
        true
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn upstream_timeout() -> Self {
        Self::new(ErrorKind::UpstreamTimeout, "Upstream provider timed out")
    }

    pub fn upstream_rate_limited() -> Self {
        Self::new(
            ErrorKind::UpstreamRateLimited,
            "Upstream provider rate limited the request",
        )
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamUnavailable, message)
    }

    pub fn bad_upstream_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadUpstreamResponse, message)
    }
}

/// Wire shape: `{"error": {"code", "message", "retryable", "details"}}`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    retryable: bool,
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.kind.code(),
                message: self.message,
                retryable: self.kind.retryable(),
                details: self.details,
            },
        };
        (status, Json(body)).into_response()
    }
}
