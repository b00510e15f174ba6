//! Request and response contracts for `POST /v1/chat`.
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Constraining the role rejects invalid inputs early (422 instead of a
/// silent pass-through to the provider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    pub role: Role,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

/// Request contract for `POST /v1/chat`.
///
/// Intentionally minimal but realistic:
/// - `model`: lets the caller pick a model; the service falls back to the
///   configured default when omitted
/// - `temperature`: controllable randomness
/// - `max_output_tokens`: prevents runaway cost/latency
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 50))]
    #[validate(nested)]
    pub messages: Vec<ChatMessage>,

    #[validate(length(min = 1, max = 200))]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    #[validate(range(min = 1, max = 4096))]
    pub max_output_tokens: u32,

    /// Opaque caller-supplied tag, carried for client-side bookkeeping.
    #[validate(length(max = 200))]
    pub client_request_id: Option<String>,
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    256
}

/// Token-accounting counters optionally reported by a provider. Absent
/// sub-fields mean the provider did not report them, never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatResponse {
    pub text: String,
    pub model: String,
    /// Wall-clock time around the provider call only, rounded to 2 decimals.
    pub latency_ms: f64,
    /// Never empty: the inbound correlation id, or a freshly generated one.
    pub request_id: String,
    pub usage: Option<ChatUsage>,
}
