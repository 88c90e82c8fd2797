use std::sync::Arc;

use analyst_agent::{DemoClient, GeminiClient, LlmClient, PricingApiClient, ToolExecutor};
use analyst_core::config::{AppConfig, ConfigError, LoadOptions};
use analyst_db::repositories::{SqlChatRepository, SqlMessageRepository};
use analyst_db::{connect, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::chat::ChatState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub chat_state: ChatState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("upstream HTTP client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let executor: Arc<dyn ToolExecutor> = Arc::new(
        PricingApiClient::new(&config.pricing_api).map_err(BootstrapError::HttpClient)?,
    );

    let llm: Arc<dyn LlmClient> = match &config.llm.api_key {
        Some(api_key) => Arc::new(
            GeminiClient::new(&config.llm, api_key.clone()).map_err(BootstrapError::HttpClient)?,
        ),
        None => {
            info!(
                event_name = "system.bootstrap.demo_mode",
                "no LLM API key configured, serving demo responses"
            );
            Arc::new(DemoClient)
        }
    };

    let chat_state = ChatState::new(
        Arc::new(SqlChatRepository::new(db_pool.clone())),
        Arc::new(SqlMessageRepository::new(db_pool.clone())),
        llm,
        executor,
    );

    Ok(Application { config, db_pool, chat_state })
}
