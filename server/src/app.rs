//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig};
use crate::core::config::AppConfig;
use crate::core::constants::{DEFAULT_LOG_FILTER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::SqliteService;
use crate::data::sqlite::SqliteDataSource;
use crate::domain::filter::{EntityRegistry, FilterService};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub database: Arc<SqliteService>,
    pub filters: Arc<FilterService>,
    pub registry: Arc<EntityRegistry>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let cli_config = cli::parse();
        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let database = Arc::new(
            SqliteService::init(&config.database.path)
                .await
                .with_context(|| format!("Failed to open database: {}", config.database.path))?,
        );
        let source = Arc::new(SqliteDataSource::new(database.pool().clone()));
        let filters = Arc::new(FilterService::new(source));
        let registry = Arc::new(config.registry());
        let shutdown = ShutdownService::new(database.clone());

        Ok(Self {
            shutdown,
            config,
            database,
            filters,
            registry,
        })
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        app.shutdown.install_signal_handlers();

        app.shutdown
            .register(
                app.database
                    .start_checkpoint_task(app.shutdown.subscribe()),
            )
            .await;

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
