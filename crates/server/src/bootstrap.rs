use std::sync::Arc;

use foody_core::config::{AppConfig, ConfigError, LoadOptions};
use foody_core::dialog::SlotValidator;
use foody_core::errors::ApplicationError;
use foody_core::{IntentDispatcher, SuggestionWorker, SystemClock};
use foody_db::repositories::{SqlRestaurantCatalog, SqlSuggestionHistory, SqlSuggestionQueue};
use foody_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::chat::{DisabledNluClient, HttpNluClient, NluClient};
use crate::mail::{mailer_from_config, MailError};
use crate::routes::AppState;
use crate::search::ElasticsearchClient;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
    pub worker: Arc<SuggestionWorker>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("mail setup failed: {0}")]
    Mail(#[from] MailError),
    #[error("client setup failed: {0}")]
    Client(#[from] ApplicationError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
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

    let queue = Arc::new(SqlSuggestionQueue::new(db_pool.clone(), config.queue.max_receive_count));
    let history = Arc::new(SqlSuggestionHistory::new(db_pool.clone()));
    let catalog = Arc::new(SqlRestaurantCatalog::new(db_pool.clone()));
    let mailer = mailer_from_config(&config.mail)?;
    let search = Arc::new(ElasticsearchClient::from_config(&config.search)?);

    let nlu: Arc<dyn NluClient> = if config.nlu.enabled {
        Arc::new(HttpNluClient::from_config(&config.nlu)?)
    } else {
        Arc::new(DisabledNluClient)
    };

    let dispatcher = IntentDispatcher::new(
        SlotValidator::new(config.dialog.supported_locations.clone()),
        queue.clone(),
        history.clone(),
        mailer.clone(),
        Arc::new(SystemClock),
    );

    let worker_search = search.clone();
    let worker = Arc::new(SuggestionWorker::new(
        queue.clone(),
        worker_search,
        catalog,
        mailer,
        history,
        config.worker_settings(),
    ));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        mail_provider = ?config.mail.provider,
        search_url = %search.search_url(),
        nlu_enabled = config.nlu.enabled,
        worker_enabled = config.queue.worker_enabled,
        "application components wired"
    );

    let state = AppState { dispatcher: Arc::new(dispatcher), nlu, db_pool: db_pool.clone(), queue };
    Ok(Application { config, db_pool, state, worker })
}
