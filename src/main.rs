use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use techbook::config::AppConfig;
use techbook::services::ai::huggingface::HfProvider;
use techbook::services::booking::BookingStore;
use techbook::services::local_now;
use techbook::services::nlp::NlpService;
use techbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let provider = Arc::new(HfProvider::new(&config)?);
    tracing::info!("warming up inference models");
    provider.warm_up(config.model_load_retries).await?;

    let nlp = NlpService::new(
        &config,
        provider.clone(),
        provider.clone(),
        Some(provider),
    );

    let store = BookingStore::new();
    store.seed_initial_data(local_now(config.timezone))?;

    let port = config.port;
    let state = Arc::new(AppState { config, store, nlp });
    let app = techbook::build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
