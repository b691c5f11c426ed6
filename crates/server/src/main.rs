mod bootstrap;
mod chat;
mod health;

use anyhow::Result;
use axum::Router;
use stocktalk_core::config::{AppConfig, LoadOptions};
use tokio::net::TcpListener;

fn init_logging(config: &AppConfig) {
    use stocktalk_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);

    let health_state = health::HealthState::new(app.db_pool.clone(), app.config.llm.model.clone());
    let chat_state = chat::ChatState::new(app.chat_repository.clone(), app.agent_runtime.clone());
    let routes =
        Router::new().merge(health::router(health_state)).merge(chat::router(chat_state));

    let listener = TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "stocktalk-server listening"
    );

    axum::serve(listener, routes).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "stocktalk-server stopping"
    );
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for ctrl-c, shutting down"
        );
    }
}
