//! Configuration parsing and validation for the gateway.
//!
//! All runtime settings come from command-line flags or environment
//! variables (12-factor); secrets stay out of code. Settings are read once
//! at startup and passed by reference to the constructors that need them.
use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// OpenAI-compatible API over HTTPS.
    Openai,
    /// Deterministic offline stub, useful for local scaffolding and tests.
    Echo,
}

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Settings {
    /// The port on which the gateway will listen.
    #[arg(short = 'p', long, env = "GATEWAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Which backend serves /v1/chat and /v1/embeddings.
    #[arg(long, env = "GATEWAY_PROVIDER", value_enum, default_value = "openai")]
    pub provider: ProviderKind,

    /// API key for the OpenAI provider. May be empty: startup still
    /// succeeds, but provider calls will be rejected upstream.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1/")]
    pub openai_base_url: Url,

    /// Per-call timeout for upstream provider requests, in seconds.
    #[arg(long, env = "OPENAI_TIMEOUT_S", default_value_t = 20.0)]
    pub openai_timeout_s: f64,

    /// How many times to retry upstream connection failures.
    #[arg(long, env = "OPENAI_MAX_RETRIES", default_value_t = 2)]
    pub openai_max_retries: u32,

    /// Model used when a chat request does not name one.
    #[arg(long, env = "DEFAULT_CHAT_MODEL", default_value = "gpt-4o-mini")]
    pub default_chat_model: String,

    /// Model used when an embeddings request does not name one.
    #[arg(long, env = "DEFAULT_EMBED_MODEL", default_value = "text-embedding-3-small")]
    pub default_embed_model: String,

    /// Whether to serve prometheus metrics.
    #[arg(short = 'm', long, default_value_t = true)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "relay")]
    pub metrics_prefix: String,

    /// Maximum number of idle HTTP connections to keep alive per upstream
    /// host.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

impl Settings {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if !self.openai_timeout_s.is_finite() || self.openai_timeout_s <= 0.0 {
            return Err(anyhow!(
                "Upstream timeout must be a positive number of seconds, got {}",
                self.openai_timeout_s
            ));
        }
        Ok(self)
    }
}
