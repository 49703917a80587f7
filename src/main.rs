use anyhow::Context;
use tracing_subscriber::EnvFilter;

use weather_api::config::AppConfig;
use weather_api::store::Stores;
use weather_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let level = &config.api.log_level;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weather_api={level},tower_http={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting weather API in {:?} mode", config.environment);

    let stores = Stores::open(&config).await.context("failed to open the store")?;
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, stores).context("failed to initialise token service")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
