//! Error type for the data layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite query or pool error
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// Row value that could not be turned into JSON
    #[error("Decode error on column {column}: {reason}")]
    Decode { column: String, reason: String },
}

impl DataError {
    pub fn from_sqlite(e: sqlx::Error) -> Self {
        Self::Sqlite(e)
    }

    pub fn decode(column: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            column: column.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure came from the backend being unreachable rather
    /// than from the query itself
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_))
        )
    }
}
