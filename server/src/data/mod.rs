//! Data storage layer
//!
//! - `traits` - the data source seam the filter service queries through
//! - `sql` - dialect-aware rendering of predicates into SQL text and binds
//! - `sqlite` - the SQLite service and its data source
//! - `error` - unified error type for data access

pub mod error;
pub mod sql;
pub mod sqlite;
pub mod traits;

pub use error::DataError;
pub use sqlite::{SqlitePool, SqliteService};
pub use traits::{FilterDataSource, QueryPlan, Record};
