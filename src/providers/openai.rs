//! OpenAI-backed provider for chat completions and embeddings.
//!
//! One pooled client is reused across all requests; timeout and retry count
//! are fixed at construction time from the process settings. Every vendor
//! failure is classified into the gateway's error taxonomy here, at the
//! provider boundary, so services never see vendor-specific errors.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, header};
use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::client::HttpClient;
use crate::errors::AppError;
use crate::providers::{ChatCompletion, ChatProvider, EmbeddingBatch, EmbeddingsProvider};
use crate::schemas::{ChatMessage, ChatUsage, EmbeddingsUsage};

/// Calls an OpenAI-compatible API over the shared [`HttpClient`].
///
/// Connection-level failures are retried up to `max_retries` times with no
/// backoff (standing in for the vendor SDK's internal retries); timeouts and
/// HTTP error statuses surface immediately.
#[derive(Debug, Clone, Builder)]
pub struct OpenAiProvider {
    #[builder(into)]
    api_key: String,
    base_url: Url,
    #[builder(default = Duration::from_secs(20))]
    timeout: Duration,
    #[builder(default = 2)]
    max_retries: u32,
    client: Arc<dyn HttpClient>,
}

#[derive(Serialize)]
struct ChatCompletionsBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionsReply {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireChatUsage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsReply {
    data: Vec<EmbeddingObject>,
    #[serde(default)]
    usage: Option<WireEmbeddingsUsage>,
}

#[derive(Deserialize)]
struct EmbeddingObject {
    embedding: Vec<f64>,
}

#[derive(Deserialize)]
struct WireEmbeddingsUsage {
    #[serde(default)]
    total_tokens: Option<u64>,
}

impl OpenAiProvider {
    /// POST a JSON payload to `{base_url}/{path}` and return the raw body on
    /// a 2xx status, classifying everything else.
    async fn post_json(&self, path: &str, payload: Vec<u8>) -> Result<Bytes, AppError> {
        if self.api_key.is_empty() {
            warn!("API key is not set; upstream call will likely be rejected");
        }

        let url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::bad_upstream_response(format!("Invalid upstream URL: {e}")))?;

        let mut attempt: u32 = 0;
        loop {
            let req = Request::builder()
                .method("POST")
                .uri(url.as_str())
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
                .body(Body::from(payload.clone()))
                .map_err(|e| {
                    AppError::bad_upstream_response(format!("Failed to build upstream request: {e}"))
                })?;

            let outcome = tokio::time::timeout(self.timeout, self.client.request(req)).await;
            let response = match outcome {
                Err(_) => return Err(AppError::upstream_timeout()),
                Ok(Err(e)) => {
                    if attempt < self.max_retries {
                        attempt += 1;
                        debug!(attempt, "retrying after upstream connection error: {e}");
                        continue;
                    }
                    return Err(AppError::upstream_unavailable(
                        "Upstream provider connection error",
                    ));
                }
                Ok(Ok(response)) => response,
            };

            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .map_err(|_| {
                    AppError::bad_upstream_response("Malformed upstream response: unreadable body")
                })?;

            if status.is_success() {
                return Ok(bytes);
            }
            return Err(if status.as_u16() == 429 {
                AppError::upstream_rate_limited()
            } else if status.is_server_error() {
                AppError::upstream_unavailable(format!(
                    "Upstream provider error (status {})",
                    status.as_u16()
                ))
            } else {
                AppError::bad_upstream_response(format!(
                    "Upstream provider error (status {})",
                    status.as_u16()
                ))
            });
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    #[instrument(skip(self, messages))]
    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f64,
        max_output_tokens: u32,
    ) -> Result<ChatCompletion, AppError> {
        let payload = serde_json::to_vec(&ChatCompletionsBody {
            model,
            messages,
            temperature,
            max_tokens: max_output_tokens,
        })
        .map_err(|e| AppError::bad_upstream_response(format!("Failed to encode request: {e}")))?;

        let bytes = self.post_json("chat/completions", payload).await?;

        let reply: ChatCompletionsReply = serde_json::from_slice(&bytes).map_err(|_| {
            AppError::bad_upstream_response("Malformed upstream response: missing text")
        })?;

        let first = reply.choices.into_iter().next().ok_or_else(|| {
            AppError::bad_upstream_response("Malformed upstream response: missing text")
        })?;

        let usage = reply.usage.map(|u| ChatUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatCompletion {
            text: first.message.content.unwrap_or_default(),
            model: Some(model.to_string()),
            usage,
        })
    }
}

#[async_trait]
impl EmbeddingsProvider for OpenAiProvider {
    #[instrument(skip(self, inputs))]
    async fn embed(&self, inputs: &[String], model: &str) -> Result<EmbeddingBatch, AppError> {
        let payload = serde_json::to_vec(&EmbeddingsBody { model, input: inputs })
            .map_err(|e| AppError::bad_upstream_response(format!("Failed to encode request: {e}")))?;

        let bytes = self.post_json("embeddings", payload).await?;

        let reply: EmbeddingsReply = serde_json::from_slice(&bytes).map_err(|_| {
            AppError::bad_upstream_response("Malformed upstream response: missing embeddings")
        })?;

        let usage = reply
            .usage
            .map(|u| EmbeddingsUsage { total_tokens: u.total_tokens });

        Ok(EmbeddingBatch {
            embeddings: reply.data.into_iter().map(|d| d.embedding).collect(),
            model: Some(model.to_string()),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::schemas::Role;
    use crate::test_utils::MockHttpClient;
    use axum::http::StatusCode;
    use serde_json::json;

    fn provider(client: MockHttpClient) -> OpenAiProvider {
        OpenAiProvider::builder()
            .api_key("sk-test-key")
            .base_url("https://api.example.com/v1/".parse().unwrap())
            .timeout(Duration::from_millis(200))
            .max_retries(2)
            .client(Arc::new(client))
            .build()
    }

    fn user_message(content: &str) -> ChatMessage {
        ChatMessage {
            role: Role::User,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn chat_success_parses_text_and_usage() {
        let body = json!({
            "choices": [{"message": {"content": "Hello!"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 5, "total_tokens": 8}
        })
        .to_string();
        let client = MockHttpClient::new(StatusCode::OK, &body);
        let provider = provider(client.clone());

        let result = provider
            .generate(&[user_message("hi")], "gpt-4o-mini", 0.2, 64)
            .await
            .unwrap();

        assert_eq!(result.text, "Hello!");
        assert_eq!(result.model.as_deref(), Some("gpt-4o-mini"));
        let usage = result.usage.unwrap();
        assert_eq!(usage.input_tokens, Some(3));
        assert_eq!(usage.output_tokens, Some(5));
        assert_eq!(usage.total_tokens, Some(8));

        // The outbound request carries the auth header and wire body shape.
        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].uri,
            "https://api.example.com/v1/chat/completions"
        );
        let auth = requests[0]
            .headers
            .iter()
            .find(|(k, _)| k == "authorization")
            .map(|(_, v)| v.clone());
        assert_eq!(auth.as_deref(), Some("Bearer sk-test-key"));
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["model"], "gpt-4o-mini");
        assert_eq!(sent["max_tokens"], 64);
        assert_eq!(sent["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn chat_absent_usage_stays_absent() {
        let body = json!({"choices": [{"message": {"content": "ok"}}]}).to_string();
        let provider = provider(MockHttpClient::new(StatusCode::OK, &body));
        let result = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap();
        assert!(result.usage.is_none());
    }

    #[tokio::test]
    async fn chat_null_content_becomes_empty_text() {
        let body = json!({"choices": [{"message": {}}]}).to_string();
        let provider = provider(MockHttpClient::new(StatusCode::OK, &body));
        let result = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap();
        assert_eq!(result.text, "");
    }

    #[tokio::test]
    async fn chat_missing_choices_is_bad_upstream_response() {
        let provider = provider(MockHttpClient::new(StatusCode::OK, r#"{"choices": []}"#));
        let err = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadUpstreamResponse);
    }

    #[tokio::test]
    async fn chat_invalid_json_is_bad_upstream_response() {
        let provider = provider(MockHttpClient::new(StatusCode::OK, "not json"));
        let err = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadUpstreamResponse);
    }

    #[tokio::test]
    async fn status_429_maps_to_rate_limited() {
        let provider = provider(MockHttpClient::new(StatusCode::TOO_MANY_REQUESTS, "{}"));
        let err = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamRateLimited);
    }

    #[tokio::test]
    async fn status_5xx_maps_to_unavailable() {
        let provider = provider(MockHttpClient::new(StatusCode::SERVICE_UNAVAILABLE, "{}"));
        let err = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn other_error_status_maps_to_bad_upstream_response() {
        let provider = provider(MockHttpClient::new(StatusCode::NOT_FOUND, "{}"));
        let err = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadUpstreamResponse);
    }

    #[tokio::test]
    async fn hang_maps_to_timeout() {
        let provider = provider(MockHttpClient::hanging());
        let err = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamTimeout);
    }

    #[tokio::test]
    async fn connection_errors_are_retried_then_unavailable() {
        let client = MockHttpClient::connection_error();
        let provider = provider(client.clone());
        let err = provider
            .generate(&[user_message("hi")], "m", 0.2, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
        // Initial attempt plus two retries.
        assert_eq!(client.get_requests().len(), 3);
    }

    #[tokio::test]
    async fn embeddings_success_preserves_order() {
        let body = json!({
            "data": [
                {"embedding": [0.1, 0.2]},
                {"embedding": [0.3, 0.4]}
            ],
            "usage": {"total_tokens": 7}
        })
        .to_string();
        let client = MockHttpClient::new(StatusCode::OK, &body);
        let provider = provider(client.clone());

        let inputs = vec!["a".to_string(), "b".to_string()];
        let result = provider.embed(&inputs, "text-embedding-3-small").await.unwrap();

        assert_eq!(result.embeddings, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
        assert_eq!(result.usage.unwrap().total_tokens, Some(7));

        let requests = client.get_requests();
        assert_eq!(requests[0].uri, "https://api.example.com/v1/embeddings");
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["input"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn embeddings_missing_data_is_bad_upstream_response() {
        let provider = provider(MockHttpClient::new(StatusCode::OK, r#"{"usage": {}}"#));
        let err = provider
            .embed(&["a".to_string()], "m")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadUpstreamResponse);
    }
}
