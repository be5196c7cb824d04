//! SQLite database service
//!
//! Owns the connection pool the entity listings read from. File databases
//! run in WAL mode with a periodic checkpoint task; `:memory:` databases use
//! a single connection so every query sees the same data.

pub mod error;
mod source;

pub use error::SqliteError;
pub use source::SqliteDataSource;
pub use sqlx::SqlitePool;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::log::LevelFilter;

use crate::core::constants::{
    SQLITE_ACQUIRE_TIMEOUT_SECS, SQLITE_BUSY_TIMEOUT_SECS, SQLITE_CACHE_SIZE,
    SQLITE_CHECKPOINT_INTERVAL_SECS, SQLITE_MAX_CONNECTIONS, SQLITE_MEMORY,
    SQLITE_WAL_AUTOCHECKPOINT,
};

/// SQLite database service
///
/// Created once at startup and shared by the data source and shutdown.
pub struct SqliteService {
    pool: SqlitePool,
    in_memory: bool,
}

impl SqliteService {
    /// Open (or create) the database at `database`: a file path, a
    /// `sqlite:` URL, or `:memory:`
    pub async fn init(database: &str) -> Result<Self, SqliteError> {
        let in_memory = database == SQLITE_MEMORY;

        let (options, max_connections) = if in_memory {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
            (options, 1)
        } else {
            let options = if database.starts_with("sqlite:") {
                SqliteConnectOptions::from_str(database).map_err(|e| SqliteError::InvalidPath {
                    path: database.to_string(),
                    reason: e.to_string(),
                })?
            } else {
                let path = Path::new(database);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                SqliteConnectOptions::new().filename(path)
            };
            let options = options
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("wal_autocheckpoint", SQLITE_WAL_AUTOCHECKPOINT);
            (options, SQLITE_MAX_CONNECTIONS)
        };

        let options = options
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
            .pragma("cache_size", SQLITE_CACHE_SIZE)
            .pragma("temp_store", "MEMORY")
            .log_statements(LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(SQLITE_ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;

        tracing::debug!(database, in_memory, "SqliteService initialized");
        Ok(Self { pool, in_memory })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn checkpoint(&self) -> Result<(), SqliteError> {
        if self.in_memory {
            return Ok(());
        }
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        tracing::debug!("WAL checkpoint completed");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }

    pub fn start_checkpoint_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let db = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SQLITE_CHECKPOINT_INTERVAL_SECS));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("WAL checkpoint task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        if let Err(e) = db.checkpoint().await {
                            tracing::warn!("WAL checkpoint failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_memory() {
        let service = SqliteService::init(":memory:").await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER)")
            .execute(service.pool())
            .await
            .unwrap();
        // single connection: the table is visible to the next query
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM t")
            .fetch_one(service.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        service.checkpoint().await.unwrap();
        service.close().await;
    }

    #[tokio::test]
    async fn test_init_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("assets.db");
        let service = SqliteService::init(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        service.checkpoint().await.unwrap();
        service.close().await;
    }

    #[tokio::test]
    async fn test_init_rejects_bad_url() {
        let result = SqliteService::init("sqlite://assets.db?bogus=1").await;
        assert!(matches!(result, Err(SqliteError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_checkpoint_task_stops_on_shutdown() {
        let service = Arc::new(SqliteService::init(":memory:").await.unwrap());
        let (tx, rx) = watch::channel(false);
        let handle = service.start_checkpoint_task(rx);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
