//! SQL text helpers

/// Escape `%`, `_` and the escape character itself so a search needle
/// matches literally inside a `LIKE ... ESCAPE '\'` pattern.
///
/// ```
/// use assetdesk_server::utils::sql::escape_like_pattern;
///
/// let needle = escape_like_pattern("50%_off");
/// assert_eq!(format!("%{}%", needle), "%50\\%\\_off%");
/// ```
pub fn escape_like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
