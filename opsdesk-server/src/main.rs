use opsdesk_server::{AppState, BoxError, Config, api, logger, seed};
use shared::util::now_millis;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let _log_guard = logger::init_logger(config.log_level.as_deref(), config.log_dir.as_deref())?;

    tracing::info!(
        environment = %config.environment,
        database = %config.database_url,
        "Starting opsdesk-server"
    );

    let state = AppState::new(&config).await?;
    if config.seed_demo_data {
        seed::seed_demo_data(&state.pool, now_millis()).await?;
    }

    let app = api::build_app(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("opsdesk-server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("opsdesk-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
