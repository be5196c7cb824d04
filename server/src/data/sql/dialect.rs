//! SQL dialect trait
//!
//! A dialect decides placeholder syntax, identifier quoting and how a
//! case-insensitive LIKE is spelled. Everything else the renderer emits is
//! portable SQL.

pub trait SqlDialect: Send + Sync {
    /// Parameter placeholder for the given 1-based index
    fn placeholder(&self, index: usize) -> String;

    /// Quote one identifier segment, doubling embedded quote characters
    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Case-insensitive LIKE of `col` against a bound pattern that uses `\`
    /// as its escape character
    fn ilike(&self, col: &str, placeholder: &str) -> String;

    fn limit_offset(&self, limit: u64, offset: u64) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }
}
