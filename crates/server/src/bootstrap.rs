use std::sync::Arc;

use showroom_core::config::{AppConfig, ConfigError, LoadOptions};
use showroom_db::{connect_with_config, migrations, DbPool, SqlQuoteHistoryStore};
use thiserror::Error;
use tracing::info;

use crate::api::AppState;
use crate::catalog::{CatalogError, CatalogSource, JsonCatalog};
use crate::email::{MailError, QuoteMailer};
use crate::pdf::{DocumentError, QuoteDocuments};
use crate::whatsapp::{WhatsAppClient, WhatsAppError};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<dyn CatalogSource>,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("catalog index could not be loaded: {0}")]
    Catalog(#[from] CatalogError),
    #[error("quotation templates could not be loaded: {0}")]
    Documents(#[from] DocumentError),
    #[error("whatsapp client could not be built: {0}")]
    WhatsApp(#[from] WhatsAppError),
    #[error("smtp mailer could not be built: {0}")]
    Mail(#[from] MailError),
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

    let db_pool = connect_with_config(&config.database)
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

    let catalog: Arc<dyn CatalogSource> = Arc::new(JsonCatalog::load(&config.catalog).await?);
    let documents = QuoteDocuments::new(&config.documents, config.company.clone())?;
    let whatsapp = WhatsAppClient::from_config(&config.whatsapp)?;
    let mailer = QuoteMailer::from_config(&config.smtp)?;
    info!(
        event_name = "system.bootstrap.integrations_ready",
        correlation_id = "bootstrap",
        products = catalog.product_count().await,
        pdf_converter = documents.converter_available(),
        whatsapp_api = whatsapp.is_some(),
        smtp_relay = mailer.is_some(),
        "catalog, documents and sharing initialized"
    );

    let history = Arc::new(SqlQuoteHistoryStore::new(db_pool.clone()));
    let state = AppState::new(
        config.clone(),
        history,
        Arc::clone(&catalog),
        documents,
        whatsapp,
        mailer,
    );

    Ok(Application { config, db_pool, catalog, state })
}
