//! SQL rendering
//!
//! Renders backend-neutral query plans into parameterized SQL through a
//! dialect.

mod dialect;
pub mod render;
mod sqlite_dialect;

pub use dialect::SqlDialect;
pub use render::{SqlParams, build_count, build_select, render_predicate};
pub use sqlite_dialect::SqliteDialect;
