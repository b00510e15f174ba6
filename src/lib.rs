//! Relay - a small LLM inference gateway
//!
//! This library proxies chat-completion and embedding requests to a pluggable
//! provider, normalizing them into a stable schema and adding request
//! correlation, latency measurement, and uniform error shaping.

use axum::Router;
use axum::routing::{get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod providers;
pub mod schemas;
pub mod services;

use client::create_hyper_client;
use config::{ProviderKind, Settings};
use providers::{ChatProvider, EchoProvider, EmbeddingsProvider, OpenAiProvider};
use services::{ChatService, EmbeddingsService};

/// The main application state: one orchestration service per capability,
/// shared read-only across all concurrent requests.
#[derive(Clone, Debug)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub embeddings: Arc<EmbeddingsService>,
}

impl AppState {
    /// Wire services around explicit providers (useful for testing).
    pub fn new(
        chat_provider: Arc<dyn ChatProvider>,
        embeddings_provider: Arc<dyn EmbeddingsProvider>,
        default_chat_model: impl Into<String>,
        default_embed_model: impl Into<String>,
    ) -> Self {
        Self {
            chat: Arc::new(ChatService::new(chat_provider, default_chat_model)),
            embeddings: Arc::new(EmbeddingsService::new(
                embeddings_provider,
                default_embed_model,
            )),
        }
    }

    /// Wire providers from process settings. The provider object is built
    /// once here and reused across all requests.
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.provider {
            ProviderKind::Echo => {
                let provider = Arc::new(EchoProvider);
                Self::new(
                    provider.clone(),
                    provider,
                    &settings.default_chat_model,
                    &settings.default_embed_model,
                )
            }
            ProviderKind::Openai => {
                if settings.openai_api_key.is_empty() {
                    warn!("OPENAI_API_KEY is not set; the OpenAI provider will fail if called");
                }
                let client = Arc::new(create_hyper_client(
                    settings.pool_max_idle_per_host,
                    Duration::from_secs(settings.pool_idle_timeout_secs),
                ));
                let provider = Arc::new(
                    OpenAiProvider::builder()
                        .api_key(settings.openai_api_key.clone())
                        .base_url(settings.openai_base_url.clone())
                        .timeout(Duration::from_secs_f64(settings.openai_timeout_s))
                        .max_retries(settings.openai_max_retries)
                        .client(client)
                        .build(),
                );
                Self::new(
                    provider.clone(),
                    provider,
                    &settings.default_chat_model,
                    &settings.default_embed_model,
                )
            }
        }
    }
}

/// Build the main router:
/// - `POST /v1/chat` - chat completion through the configured provider
/// - `POST /v1/embeddings` - embeddings through the configured provider
/// - `GET /v1/health` - liveness and version
///
/// The request-context middleware wraps every route, so all responses carry
/// `X-Request-ID` and `X-Response-Time-ms`.
#[instrument(skip(state))]
pub fn build_router(state: AppState) -> Router {
    info!("Building router");
    Router::new()
        .route("/v1/chat", post(handlers::chat))
        .route("/v1/embeddings", post(handlers::embeddings))
        .route("/v1/health", get(handlers::health))
        .layer(axum::middleware::from_fn(middleware::request_context))
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}

pub mod test_utils {
    //! Offline doubles shared by unit and integration tests.
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::{Arc, Mutex};

    use crate::client::HttpClient;
    use crate::errors::AppError;
    use crate::providers::{ChatCompletion, ChatProvider, EmbeddingBatch, EmbeddingsProvider};
    use crate::schemas::ChatMessage;

    #[derive(Clone)]
    enum MockBehavior {
        Respond(Arc<dyn Fn() -> axum::response::Response + Send + Sync>),
        /// Never resolves; exercises the provider-call timeout.
        Hang,
        /// Fails like a refused connection; exercises the retry path.
        ConnectionError,
    }

    /// Records every outbound request and replays a configured behavior.
    #[derive(Clone)]
    pub struct MockHttpClient {
        pub requests: Arc<Mutex<Vec<MockRequest>>>,
        behavior: MockBehavior,
    }

    #[derive(Debug, Clone)]
    pub struct MockRequest {
        pub method: String,
        pub uri: String,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl MockHttpClient {
        pub fn new(status: StatusCode, body: &str) -> Self {
            let body = body.to_string();
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                behavior: MockBehavior::Respond(Arc::new(move || {
                    axum::response::Response::builder()
                        .status(status)
                        .body(axum::body::Body::from(body.clone()))
                        .unwrap()
                })),
            }
        }

        pub fn hanging() -> Self {
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                behavior: MockBehavior::Hang,
            }
        }

        pub fn connection_error() -> Self {
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                behavior: MockBehavior::ConnectionError,
            }
        }

        pub fn get_requests(&self) -> Vec<MockRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl std::fmt::Debug for MockHttpClient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockHttpClient")
                .field("requests", &self.requests)
                .finish()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn request(
            &self,
            req: axum::extract::Request,
        ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
            let method = req.method().to_string();
            let uri = req.uri().to_string();
            let headers = req
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                .collect();

            let body = axum::body::to_bytes(req.into_body(), usize::MAX)
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?
                .to_vec();

            self.requests.lock().unwrap().push(MockRequest {
                method,
                uri,
                headers,
                body,
            });

            match &self.behavior {
                MockBehavior::Respond(builder) => Ok(builder()),
                MockBehavior::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                MockBehavior::ConnectionError => Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))),
            }
        }
    }

    /// Chat provider that always fails with a fixed error.
    #[derive(Debug, Clone)]
    pub struct FailingChatProvider(pub AppError);

    #[async_trait]
    impl ChatProvider for FailingChatProvider {
        async fn generate(
            &self,
            _messages: &[ChatMessage],
            _model: &str,
            _temperature: f64,
            _max_output_tokens: u32,
        ) -> Result<ChatCompletion, AppError> {
            Err(self.0.clone())
        }
    }

    /// Embeddings provider that always fails with a fixed error.
    #[derive(Debug, Clone)]
    pub struct FailingEmbeddingsProvider(pub AppError);

    #[async_trait]
    impl EmbeddingsProvider for FailingEmbeddingsProvider {
        async fn embed(
            &self,
            _inputs: &[String],
            _model: &str,
        ) -> Result<EmbeddingBatch, AppError> {
            Err(self.0.clone())
        }
    }
}
