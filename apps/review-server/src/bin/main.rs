use tracing_subscriber::EnvFilter;

use review_core::config::Config;
use review_server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = Config::load().map_err(|e| { tracing::error!(error = %e, "failed to load config"); e })?;
    let settings = config.settings()?;
    let base = std::env::current_dir()?;
    let state = AppState::from_settings(&settings, &base).await?;
    let app = router(state, &settings.server);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, env = config.env_name(), model = %settings.generation.question_model, "review server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
