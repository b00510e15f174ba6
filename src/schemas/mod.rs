//! Wire schemas for the gateway's stable request/response contracts.
//!
//! All bodies reject unknown fields so client typos surface as 422s instead
//! of silent bugs; bounds are enforced with `validator` before any service
//! logic runs.
pub mod chat;
pub mod embeddings;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, ChatUsage, Role};
pub use embeddings::{EmbeddingInput, EmbeddingsRequest, EmbeddingsResponse, EmbeddingsUsage};
