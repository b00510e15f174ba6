//! Orchestrates embedding requests: normalize the input shape, call the
//! provider, measure inference latency, and return the stable response.
use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;

use crate::context;
use crate::errors::AppError;
use crate::providers::EmbeddingsProvider;
use crate::schemas::{EmbeddingsRequest, EmbeddingsResponse};
use crate::services::round_ms;

#[derive(Debug, Clone)]
pub struct EmbeddingsService {
    provider: Arc<dyn EmbeddingsProvider>,
    default_model: String,
}

impl EmbeddingsService {
    pub fn new(provider: Arc<dyn EmbeddingsProvider>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn embed(&self, request: EmbeddingsRequest) -> Result<EmbeddingsResponse, AppError> {
        let model = request
            .model
            .unwrap_or_else(|| self.default_model.clone());
        let inputs = request.input.into_inputs();

        let start = Instant::now();
        let result = self.provider.embed(&inputs, &model).await?;
        let latency_ms = round_ms(start.elapsed().as_secs_f64() * 1000.0);

        let request_id = context::current_request_id().unwrap_or_else(|| "unknown".to_string());

        Ok(EmbeddingsResponse {
            embeddings: result.embeddings,
            model: result.model.unwrap_or(model),
            latency_ms,
            request_id,
            usage: result.usage,
        })
    }
}
