//! Pluggable provider backends for chat completion and embeddings.
//!
//! The orchestration services depend only on these two capability traits, so
//! vendors can be swapped at wiring time and unit tests run offline against
//! the deterministic stubs.
use async_trait::async_trait;

use crate::errors::AppError;
use crate::schemas::{ChatMessage, ChatUsage, EmbeddingsUsage};

pub mod echo;
pub mod openai;

pub use echo::EchoProvider;
pub use openai::OpenAiProvider;

/// The normalized result of one chat completion. `model` and `usage` are
/// optional pass-throughs; absence means the backend did not report them.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub text: String,
    pub model: Option<String>,
    pub usage: Option<ChatUsage>,
}

/// The normalized result of one embeddings call: one vector per input, in
/// input order.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBatch {
    pub embeddings: Vec<Vec<f64>>,
    pub model: Option<String>,
    pub usage: Option<EmbeddingsUsage>,
}

/// Capability contract for chat completion backends.
///
/// Implementations are the only place vendor-specific failures are caught;
/// everything crossing back into the services is already an [`AppError`].
#[async_trait]
pub trait ChatProvider: std::fmt::Debug + Send + Sync {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f64,
        max_output_tokens: u32,
    ) -> Result<ChatCompletion, AppError>;
}

/// Capability contract for embeddings backends.
#[async_trait]
pub trait EmbeddingsProvider: std::fmt::Debug + Send + Sync {
    /// Given ≥1 input strings, produce one vector per string, same order.
    async fn embed(&self, inputs: &[String], model: &str) -> Result<EmbeddingBatch, AppError>;
}
