use std::sync::Arc;

use meesaya_agent::{
    ConversationOrchestrator, LlmError, OpenRouterClient, OrchestratorSettings, ToolDispatcher,
};
use meesaya_core::config::{AppConfig, ConfigError, LoadOptions};
use meesaya_core::sizing::SizingEngine;
use meesaya_db::{
    connect_from_config, migrations, DbPool, SqlCatalogRepository, SqlConversationHistory,
    SqlKnowledgeBase,
};
use thiserror::Error;
use tracing::info;

use crate::telegram::TelegramMessenger;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub messenger: Arc<TelegramMessenger>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("missing required secret `{0}`")]
    MissingSecret(&'static str),
    #[error("llm client setup failed: {0}")]
    Llm(#[source] LlmError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Wires store, engine, model client and messenger; secrets are checked before
/// the database is touched.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    if !config.telegram.is_configured() {
        return Err(BootstrapError::MissingSecret("telegram.bot_token"));
    }
    let llm = OpenRouterClient::from_config(&config.llm).map_err(|error| match error {
        LlmError::MissingApiKey => BootstrapError::MissingSecret("llm.api_key"),
        other => BootstrapError::Llm(other),
    })?;

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    let engine = SizingEngine::new(Arc::new(SqlCatalogRepository::new(db_pool.clone())))
        .with_mode(config.sizing.mode);
    let messenger = Arc::new(TelegramMessenger::from_config(&config.telegram));
    let orchestrator = ConversationOrchestrator::new(
        Arc::new(llm),
        ToolDispatcher::new(engine),
        Arc::new(SqlConversationHistory::new(db_pool.clone())),
        Arc::new(SqlKnowledgeBase::new(db_pool.clone())),
        messenger.clone(),
    )
    .with_settings(OrchestratorSettings::from_config(&config));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        sizing_mode = ?config.sizing.mode,
        "conversation runtime assembled"
    );

    Ok(Application { config, db_pool, orchestrator: Arc::new(orchestrator), messenger })
}
