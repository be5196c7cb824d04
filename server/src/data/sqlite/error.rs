//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid database path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
