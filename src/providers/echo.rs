//! Deterministic stub provider for tests and local scaffolding.
//!
//! Keeps tests offline and fast, and avoids an API key dependency in CI.
use async_trait::async_trait;

use crate::errors::AppError;
use crate::providers::{ChatCompletion, ChatProvider, EmbeddingBatch, EmbeddingsProvider};
use crate::schemas::{ChatMessage, Role};

/// Echoes the most recent user message back; embeds strings by length.
/// No I/O, no failure modes, usage always absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProvider;

#[async_trait]
impl ChatProvider for EchoProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
        _temperature: f64,
        _max_output_tokens: u32,
    ) -> Result<ChatCompletion, AppError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str());

        let text = match last_user {
            Some(content) => format!("echo: {content}"),
            None => "echo:".to_string(),
        };

        Ok(ChatCompletion {
            text,
            model: Some(model.to_string()),
            usage: None,
        })
    }
}

#[async_trait]
impl EmbeddingsProvider for EchoProvider {
    async fn embed(&self, inputs: &[String], model: &str) -> Result<EmbeddingBatch, AppError> {
        let embeddings = inputs
            .iter()
            .map(|s| {
                let n = s.chars().count() as f64;
                vec![n, n + 1.0, n + 2.0, n + 3.0]
            })
            .collect();

        Ok(EmbeddingBatch {
            embeddings,
            model: Some(model.to_string()),
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn most_recent_user_message_wins() {
        let messages = vec![
            message(Role::User, "hi"),
            message(Role::Assistant, "yo"),
            message(Role::User, "hello"),
        ];
        let result = EchoProvider
            .generate(&messages, "test-model", 0.2, 64)
            .await
            .unwrap();
        assert_eq!(result.text, "echo: hello");
        assert_eq!(result.model.as_deref(), Some("test-model"));
        assert!(result.usage.is_none());
    }

    #[tokio::test]
    async fn user_message_beats_trailing_assistant_message() {
        let messages = vec![
            message(Role::User, "question"),
            message(Role::Assistant, "answer"),
        ];
        let result = EchoProvider
            .generate(&messages, "m", 0.2, 64)
            .await
            .unwrap();
        assert_eq!(result.text, "echo: question");
    }

    #[tokio::test]
    async fn no_user_message_yields_bare_echo() {
        let messages = vec![message(Role::System, "be nice")];
        let result = EchoProvider
            .generate(&messages, "m", 0.2, 64)
            .await
            .unwrap();
        assert_eq!(result.text, "echo:");
    }

    #[tokio::test]
    async fn embeddings_are_length_based_vectors() {
        let inputs = vec!["a".to_string(), "bb".to_string()];
        let result = EchoProvider.embed(&inputs, "embed-model").await.unwrap();
        assert_eq!(
            result.embeddings,
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![2.0, 3.0, 4.0, 5.0]]
        );
        assert!(result.usage.is_none());
    }
}
