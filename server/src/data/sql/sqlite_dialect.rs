//! SQLite SQL dialect implementation

use super::SqlDialect;

pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn ilike(&self, col: &str, placeholder: &str) -> String {
        // LIKE is only ASCII case-insensitive in SQLite; LOWER both sides
        format!("LOWER({}) LIKE LOWER({}) ESCAPE '\\'", col, placeholder)
    }
}
