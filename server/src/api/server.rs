//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::{entities, health};
use crate::core::CoreApp;
use crate::core::constants::MAX_REQUEST_BODY_BYTES;
use crate::data::SqlitePool;
use crate::domain::filter::{EntityRegistry, FilterService};

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Serve until shutdown is triggered; returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(
            host.parse()
                .with_context(|| format!("Invalid server host: {}", host))?,
            port,
        );

        let router = router(
            app.database.pool().clone(),
            app.filters.clone(),
            app.registry.clone(),
            &allowed_origins,
        );

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!(
            address = %addr,
            entities = ?app.registry.names(),
            "Listening"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// Full application router
pub fn router(
    pool: SqlitePool,
    filters: Arc<FilterService>,
    registry: Arc<EntityRegistry>,
    allowed_origins: &AllowedOrigins,
) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health).with_state(pool))
        .nest("/api/v1/entities", entities::routes(filters, registry))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
}
