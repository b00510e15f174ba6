//! Orchestrates chat requests: call the provider, measure inference
//! latency, and shape the provider output into the stable API response.
use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;

use crate::context;
use crate::errors::AppError;
use crate::providers::ChatProvider;
use crate::schemas::{ChatRequest, ChatResponse};
use crate::services::round_ms;

#[derive(Debug, Clone)]
pub struct ChatService {
    provider: Arc<dyn ChatProvider>,
    default_model: String,
}

impl ChatService {
    pub fn new(provider: Arc<dyn ChatProvider>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);

        let start = Instant::now();
        let result = self
            .provider
            .generate(
                &request.messages,
                model,
                request.temperature,
                request.max_output_tokens,
            )
            .await?;
        let latency_ms = round_ms(start.elapsed().as_secs_f64() * 1000.0);

        // The boundary layer always establishes the id; "unknown" is a
        // defensive fallback for callers outside an HTTP request.
        let request_id = context::current_request_id().unwrap_or_else(|| "unknown".to_string());

        Ok(ChatResponse {
            text: result.text,
            model: result.model.unwrap_or_else(|| model.to_string()),
            latency_ms,
            request_id,
            usage: result.usage,
        })
    }
}
