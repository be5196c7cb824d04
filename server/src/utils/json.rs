//! JSON utility functions

use serde_json::{Map, Value as JsonValue};

/// Insert `value` at a dotted path, creating intermediate objects.
///
/// A non-object found on the way is replaced by an object.
///
/// # Example
///
/// ```
/// use serde_json::{Map, json};
/// use assetdesk_server::utils::json::insert_path;
///
/// let mut obj = Map::new();
/// insert_path(&mut obj, "unit.name", json!("IT"));
/// assert_eq!(serde_json::Value::Object(obj), json!({"unit": {"name": "IT"}}));
/// ```
pub fn insert_path(target: &mut Map<String, JsonValue>, path: &str, value: JsonValue) {
    let mut segments = path.split('.').peekable();
    let mut current = target;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if !entry.is_object() {
            *entry = JsonValue::Object(Map::new());
        }
        let JsonValue::Object(next) = entry else {
            return;
        };
        current = next;
    }
}

/// Look up a dotted path through nested objects
pub fn lookup_path<'a>(source: &'a Map<String, JsonValue>, path: &str) -> Option<&'a JsonValue> {
    let mut segments = path.split('.');
    let mut value = source.get(segments.next()?)?;
    for segment in segments {
        value = value.as_object()?.get(segment)?;
    }
    Some(value)
}
