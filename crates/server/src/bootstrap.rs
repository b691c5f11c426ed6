use std::sync::Arc;

use stocktalk_agent::{
    AgentRuntime, ContextRouter, GeminiClient, LlmError, RetryPolicy, RouterOptions,
    SampleDataFallback,
};
use stocktalk_core::config::{AppConfig, ConfigError};
use stocktalk_db::repositories::{SqlChatRepository, SqlInventoryRepository};
use stocktalk_db::{connect_with_config, migrations, ChatRepository, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub chat_repository: Arc<dyn ChatRepository>,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("model client setup failed: {0}")]
    Llm(#[source] LlmError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let llm = GeminiClient::new(&config.llm).map_err(BootstrapError::Llm)?;
    info!(
        event_name = "system.bootstrap.model_client_ready",
        correlation_id = "bootstrap",
        model = llm.model(),
        max_retries = config.llm.max_retries,
        "model client configured"
    );

    let router = ContextRouter::new(
        Arc::new(SqlInventoryRepository::new(db_pool.clone())),
        Arc::new(SampleDataFallback),
        RouterOptions {
            product_limit: config.assistant.product_limit,
            default_currency: config.assistant.default_currency,
        },
    );
    let agent_runtime = AgentRuntime::new(router, Arc::new(llm))
        .with_retry_policy(RetryPolicy::from_config(&config.llm));

    Ok(Application {
        chat_repository: Arc::new(SqlChatRepository::new(db_pool.clone())),
        agent_runtime: Arc::new(agent_runtime),
        db_pool,
        config,
    })
}
