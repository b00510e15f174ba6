use clap::Parser as _;
use relay::config::Settings;
use relay::{AppState, build_metrics_layer_and_handle, build_metrics_router, build_router};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // Structured JSON logs; level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::parse().validate()?;
    info!(
        port = settings.port,
        provider = ?settings.provider,
        "Starting LLM gateway"
    );

    let state = AppState::from_settings(&settings);
    let mut router = build_router(state);

    if settings.metrics {
        let (prometheus_layer, handle) =
            build_metrics_layer_and_handle(settings.metrics_prefix.clone());
        router = router.layer(prometheus_layer);

        let metrics_router = build_metrics_router(handle);
        let metrics_addr = format!("0.0.0.0:{}", settings.metrics_port);
        let metrics_listener = TcpListener::bind(&metrics_addr).await?;
        info!("Metrics server listening on {}", metrics_addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_router).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let bind_addr = format!("0.0.0.0:{}", settings.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("LLM gateway listening on {}", bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
