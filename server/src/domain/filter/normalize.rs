//! Condition normalizer
//!
//! Turns loosely-typed frontend input into canonical filter values. Nothing
//! here fails: unknown operators become CONTAINS, unknown field types become
//! TEXT, and malformed fragments are dropped. Running the normalizer over its
//! own output yields the same conditions.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use super::entity::EntityConfig;
use super::types::{
    ConditionLogic, FieldType, FilterCondition, FilterOperator, FilterRequest, PaginationSpec,
    SortDirection, SortSpec,
};

/// Map an operator spelling to its canonical form
pub fn normalize_operator(raw: &str) -> FilterOperator {
    match raw.trim().to_ascii_lowercase().as_str() {
        "equals" | "eq" | "=" | "==" | "is" => FilterOperator::Equals,
        "contains" | "like" | "ilike" => FilterOperator::Contains,
        "starts_with" | "startswith" | "starts" => FilterOperator::StartsWith,
        "ends_with" | "endswith" | "ends" => FilterOperator::EndsWith,
        "greater_than" | "gt" | ">" => FilterOperator::GreaterThan,
        "greater_than_or_equal" | "gte" | "ge" | ">=" => FilterOperator::GreaterThanOrEqual,
        "less_than" | "lt" | "<" => FilterOperator::LessThan,
        "less_than_or_equal" | "lte" | "le" | "<=" => FilterOperator::LessThanOrEqual,
        "in" | "any_of" => FilterOperator::In,
        "not_in" | "nin" | "not_contains" | "none_of" => FilterOperator::NotIn,
        "between" | "range" => FilterOperator::Between,
        _ => FilterOperator::Contains,
    }
}

/// Map the UI's match-mode vocabulary to a logic.
///
/// The UI labels "match all" as `contains` and "match any" as `equals`, so
/// those map to AND and OR respectively. Only the query-string surface uses
/// this mapping; request bodies go through [`ConditionLogic::parse`].
pub fn normalize_condition_logic(raw: &str) -> ConditionLogic {
    match raw.trim().to_ascii_lowercase().as_str() {
        "or" | "equals" => ConditionLogic::Or,
        _ => ConditionLogic::And,
    }
}

pub fn normalize_field_type(raw: &str) -> FieldType {
    match raw.trim().to_ascii_lowercase().as_str() {
        "number" => FieldType::Number,
        "date" => FieldType::Date,
        "select" => FieldType::Select,
        "boolean" => FieldType::Boolean,
        _ => FieldType::Text,
    }
}

/// Coerce a raw value into a list.
///
/// Lists pass through, a present scalar becomes a one-element list, and
/// null, absent or the empty string become an empty list.
pub fn coerce_value(raw: Option<&Value>) -> Vec<Value> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.is_empty() => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

/// Apply the type-specific element coercion for BOOLEAN and NUMBER fields
pub fn coerce_for_type(values: Vec<Value>, field_type: FieldType) -> Vec<Value> {
    match field_type {
        FieldType::Boolean => values.into_iter().map(coerce_boolean).collect(),
        FieldType::Number => values.into_iter().map(coerce_number).collect(),
        _ => values,
    }
}

fn coerce_boolean(value: Value) -> Value {
    let text = match &value {
        Value::String(s) => s.trim().to_ascii_lowercase(),
        other => other.to_string(),
    };
    Value::Bool(text == "true" || text == "1")
}

fn coerce_number(value: Value) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(value)
}

/// Loose text view of a scalar: strings are trimmed, numbers and booleans
/// are rendered, anything else is absent.
fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    as_text(value).filter(|s| !s.is_empty())
}

/// Loose integer view: JSON numbers or numeric strings
fn as_integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Raw condition as it arrives from a client, before any defaulting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCondition {
    pub field: Option<Value>,
    pub field_type: Option<Value>,
    pub operator: Option<Value>,
    pub value: Option<Value>,
    pub date_from: Option<Value>,
    pub date_to: Option<Value>,
    pub sort: Option<Value>,
}

impl RawCondition {
    /// Read a condition from any JSON value. Non-objects yield an empty
    /// condition, which the normalizer then drops.
    pub fn from_value(raw: &Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::default();
        };
        let get = |key: &str| obj.get(key).cloned();
        Self {
            field: get("field"),
            field_type: get("fieldType"),
            operator: get("operator"),
            value: get("value"),
            date_from: get("dateFrom"),
            date_to: get("dateTo"),
            sort: get("sort"),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        let entries = [
            ("field", &self.field),
            ("fieldType", &self.field_type),
            ("operator", &self.operator),
            ("value", &self.value),
            ("dateFrom", &self.date_from),
            ("dateTo", &self.date_to),
            ("sort", &self.sort),
        ];
        for (key, value) in entries {
            if let Some(v) = value {
                obj.insert(key.to_string(), v.clone());
            }
        }
        Value::Object(obj)
    }
}

impl From<&FilterCondition> for RawCondition {
    fn from(cond: &FilterCondition) -> Self {
        Self {
            field: Some(Value::String(cond.field.clone())),
            field_type: Some(Value::String(cond.field_type.as_str().to_string())),
            operator: Some(Value::String(cond.operator.as_str().to_string())),
            value: Some(Value::Array(cond.value.clone())),
            date_from: cond.date_from.clone().map(Value::String),
            date_to: cond.date_to.clone().map(Value::String),
            sort: cond
                .sort
                .map(|d| Value::String(d.as_sql().to_ascii_lowercase())),
        }
    }
}

/// Normalize one raw condition.
///
/// Returns `None` when the field is missing or blank, or when no operator
/// was supplied. When `fieldType` is omitted the entity's field type table is
/// consulted before falling back to TEXT.
pub fn normalize_condition(
    raw: &RawCondition,
    field_types: &HashMap<String, FieldType>,
) -> Option<FilterCondition> {
    let Some(field) = non_blank(raw.field.as_ref()) else {
        tracing::trace!(?raw, "Dropping condition without field");
        return None;
    };
    let Some(operator) = as_text(raw.operator.as_ref()) else {
        tracing::trace!(field = %field, "Dropping condition without operator");
        return None;
    };

    let field_type = non_blank(raw.field_type.as_ref())
        .map(|t| normalize_field_type(&t))
        .or_else(|| field_types.get(&field).copied())
        .unwrap_or_default();

    let value = coerce_for_type(coerce_value(raw.value.as_ref()), field_type);

    Some(FilterCondition {
        field,
        field_type,
        operator: normalize_operator(&operator),
        value,
        date_from: non_blank(raw.date_from.as_ref()),
        date_to: non_blank(raw.date_to.as_ref()),
        sort: non_blank(raw.sort.as_ref()).map(|s| SortDirection::parse(&s)),
    })
}

/// Normalize one raw sort entry; entries without a field are dropped
pub fn normalize_sort(raw: &Value) -> Option<SortSpec> {
    let obj = raw.as_object()?;
    let field = non_blank(obj.get("field"))?;
    let direction = as_text(obj.get("direction"))
        .map(|d| SortDirection::parse(&d))
        .unwrap_or_default();
    let priority = as_integer(obj.get("priority"))
        .map(|p| p.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
        .unwrap_or(0);
    Some(SortSpec::new(field, direction, priority))
}

/// Normalize a whole request body against an entity's defaults
pub fn normalize_request(raw: &Value, entity: &EntityConfig) -> FilterRequest {
    let condition_logic = non_blank(raw.get("conditionLogic"))
        .map(|l| ConditionLogic::parse(&l))
        .unwrap_or(entity.default_logic);

    let conditions = raw
        .get("conditions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    normalize_condition(&RawCondition::from_value(item), &entity.field_types)
                })
                .collect()
        })
        .unwrap_or_default();

    let pagination = raw.get("pagination");
    let page = as_integer(pagination.and_then(|p| p.get("currentPage")));
    let limit = as_integer(pagination.and_then(|p| p.get("itemsPerPage")));
    let pagination = PaginationSpec::new(
        page.map(clamp_u32).unwrap_or(1),
        limit.map(clamp_u32).unwrap_or(entity.default_limit),
    );

    let sorting = raw
        .get("sorting")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_sort).collect())
        .unwrap_or_default();

    FilterRequest {
        condition_logic,
        conditions,
        pagination,
        sorting,
        search: non_blank(raw.get("search")),
    }
}

fn clamp_u32(n: i64) -> u32 {
    n.clamp(1, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_types() -> HashMap<String, FieldType> {
        HashMap::new()
    }

    fn entity() -> EntityConfig {
        serde_json::from_value(json!({
            "name": "assets",
            "table": "assets",
            "field_types": {"price": "number", "active": "boolean"}
        }))
        .unwrap()
    }

    #[test]
    fn test_operator_aliases() {
        let table: &[(&[&str], FilterOperator)] = &[
            (&["equals", "eq", "=", "==", "is"], FilterOperator::Equals),
            (&["contains", "like", "ilike"], FilterOperator::Contains),
            (
                &["starts_with", "startswith", "starts"],
                FilterOperator::StartsWith,
            ),
            (&["ends_with", "endswith", "ends"], FilterOperator::EndsWith),
            (&["greater_than", "gt", ">"], FilterOperator::GreaterThan),
            (
                &["greater_than_or_equal", "gte", "ge", ">="],
                FilterOperator::GreaterThanOrEqual,
            ),
            (&["less_than", "lt", "<"], FilterOperator::LessThan),
            (
                &["less_than_or_equal", "lte", "le", "<="],
                FilterOperator::LessThanOrEqual,
            ),
            (&["in", "any_of"], FilterOperator::In),
            (
                &["not_in", "nin", "not_contains", "none_of"],
                FilterOperator::NotIn,
            ),
            (&["between", "range"], FilterOperator::Between),
        ];
        for (aliases, expected) in table {
            for alias in *aliases {
                assert_eq!(normalize_operator(alias), *expected, "alias {alias}");
                assert_eq!(
                    normalize_operator(&format!("  {}  ", alias.to_uppercase())),
                    *expected
                );
            }
        }
    }

    #[test]
    fn test_unknown_operator_falls_back_to_contains() {
        assert_eq!(normalize_operator("frobnicate"), FilterOperator::Contains);
        assert_eq!(normalize_operator(""), FilterOperator::Contains);
    }

    #[test]
    fn test_condition_logic_ui_vocabulary() {
        assert_eq!(normalize_condition_logic("and"), ConditionLogic::And);
        assert_eq!(normalize_condition_logic("contains"), ConditionLogic::And);
        assert_eq!(normalize_condition_logic("OR"), ConditionLogic::Or);
        assert_eq!(normalize_condition_logic("equals"), ConditionLogic::Or);
        assert_eq!(normalize_condition_logic("maybe"), ConditionLogic::And);
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(normalize_field_type("Number"), FieldType::Number);
        assert_eq!(normalize_field_type("DATE"), FieldType::Date);
        assert_eq!(normalize_field_type("select"), FieldType::Select);
        assert_eq!(normalize_field_type("boolean"), FieldType::Boolean);
        assert_eq!(normalize_field_type("text"), FieldType::Text);
        assert_eq!(normalize_field_type("uuid"), FieldType::Text);
    }

    #[test]
    fn test_coerce_value_always_list() {
        assert_eq!(coerce_value(None), Vec::<Value>::new());
        assert_eq!(coerce_value(Some(&Value::Null)), Vec::<Value>::new());
        assert_eq!(coerce_value(Some(&json!(""))), Vec::<Value>::new());
        assert_eq!(coerce_value(Some(&json!("x"))), vec![json!("x")]);
        assert_eq!(coerce_value(Some(&json!(0))), vec![json!(0)]);
        assert_eq!(coerce_value(Some(&json!(false))), vec![json!(false)]);
        assert_eq!(coerce_value(Some(&json!([1, "a"]))), vec![json!(1), json!("a")]);
        assert_eq!(coerce_value(Some(&json!([]))), Vec::<Value>::new());
    }

    #[test]
    fn test_boolean_coercion() {
        let values = vec![
            json!("true"),
            json!("TRUE"),
            json!("1"),
            json!(1),
            json!(true),
            json!("yes"),
            json!(0),
            json!(false),
        ];
        let coerced = coerce_for_type(values, FieldType::Boolean);
        assert_eq!(
            coerced,
            vec![
                json!(true),
                json!(true),
                json!(true),
                json!(true),
                json!(true),
                json!(false),
                json!(false),
                json!(false)
            ]
        );
    }

    #[test]
    fn test_number_coercion_keeps_unparseable() {
        let coerced = coerce_for_type(
            vec![json!("42"), json!(" 2.5 "), json!("abc"), json!(7)],
            FieldType::Number,
        );
        assert_eq!(coerced, vec![json!(42), json!(2.5), json!("abc"), json!(7)]);
    }

    #[test]
    fn test_normalize_condition_defaults() {
        let raw = RawCondition::from_value(&json!({
            "field": " name ",
            "operator": "LIKE",
            "value": "laptop"
        }));
        let cond = normalize_condition(&raw, &no_types()).unwrap();
        assert_eq!(cond.field, "name");
        assert_eq!(cond.field_type, FieldType::Text);
        assert_eq!(cond.operator, FilterOperator::Contains);
        assert_eq!(cond.value, vec![json!("laptop")]);
        assert_eq!(cond.sort, None);
    }

    #[test]
    fn test_normalize_condition_infers_type_from_entity() {
        let mut types = HashMap::new();
        types.insert("price".to_string(), FieldType::Number);
        let raw = RawCondition::from_value(&json!({
            "field": "price",
            "operator": "gt",
            "value": "100"
        }));
        let cond = normalize_condition(&raw, &types).unwrap();
        assert_eq!(cond.field_type, FieldType::Number);
        assert_eq!(cond.value, vec![json!(100)]);

        // explicit type wins over the table
        let raw = RawCondition::from_value(&json!({
            "field": "price",
            "fieldType": "text",
            "operator": "gt",
            "value": "100"
        }));
        let cond = normalize_condition(&raw, &types).unwrap();
        assert_eq!(cond.field_type, FieldType::Text);
        assert_eq!(cond.value, vec![json!("100")]);
    }

    #[test]
    fn test_normalize_condition_drops_malformed() {
        let cases = [
            json!({"operator": "eq", "value": 1}),
            json!({"field": "   ", "operator": "eq", "value": 1}),
            json!({"field": "name", "value": 1}),
            json!("not an object"),
            json!(null),
        ];
        for case in cases {
            let raw = RawCondition::from_value(&case);
            assert!(normalize_condition(&raw, &no_types()).is_none(), "{case}");
        }
    }

    #[test]
    fn test_normalize_condition_dates_and_sort() {
        let raw = RawCondition::from_value(&json!({
            "field": "purchased_at",
            "fieldType": "date",
            "operator": "between",
            "dateFrom": "2024-01-01",
            "dateTo": "",
            "sort": "DESC"
        }));
        let cond = normalize_condition(&raw, &no_types()).unwrap();
        assert_eq!(cond.date_from.as_deref(), Some("2024-01-01"));
        assert_eq!(cond.date_to, None);
        assert_eq!(cond.sort, Some(SortDirection::Desc));
        assert!(cond.value.is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            json!({"field": "price", "fieldType": "NUMBER", "operator": ">=", "value": ["10", "x"]}),
            json!({"field": "active", "fieldType": "boolean", "operator": "is", "value": "1"}),
            json!({"field": "name", "operator": "weird", "value": "abc", "sort": "desc"}),
            json!({"field": "d", "fieldType": "date", "operator": "range",
                   "dateFrom": "2024-01-01", "dateTo": "2024-02-01"}),
            json!({"field": "status", "fieldType": "select", "operator": "none_of", "value": ["a", "b"]}),
        ];
        for input in inputs {
            let once = normalize_condition(&RawCondition::from_value(&input), &no_types()).unwrap();
            let raw_again = RawCondition::from(&once);
            let twice = normalize_condition(&raw_again, &no_types()).unwrap();
            assert_eq!(once, twice, "input {input}");

            let via_json = RawCondition::from_value(&raw_again.to_value());
            assert_eq!(via_json, raw_again);
        }
    }

    #[test]
    fn test_normalize_sort() {
        let spec = normalize_sort(&json!({"field": "name", "direction": "DESC", "priority": "2"}))
            .unwrap();
        assert_eq!(spec, SortSpec::new("name", SortDirection::Desc, 2));

        let spec = normalize_sort(&json!({"field": "name"})).unwrap();
        assert_eq!(spec, SortSpec::new("name", SortDirection::Asc, 0));

        assert!(normalize_sort(&json!({"direction": "asc"})).is_none());
        assert!(normalize_sort(&json!(["name"])).is_none());
    }

    #[test]
    fn test_normalize_request_full() {
        let body = json!({
            "conditionLogic": "contains",
            "conditions": [
                {"field": "name", "operator": "contains", "value": "lap"},
                {"operator": "eq", "value": 1},
                {"field": "price", "operator": "gte", "value": "500"},
                {"field": "active", "operator": "eq", "value": "true"}
            ],
            "pagination": {"currentPage": "3", "itemsPerPage": 5},
            "sorting": [{"field": "name", "direction": "desc", "priority": 1}],
            "search": "  dell "
        });
        let req = normalize_request(&body, &entity());
        assert_eq!(req.condition_logic, ConditionLogic::Contains);
        assert_eq!(req.conditions.len(), 3);
        assert_eq!(req.conditions[1].value, vec![json!(500)]);
        assert_eq!(req.conditions[2].value, vec![json!(true)]);
        assert_eq!(req.pagination, PaginationSpec::new(3, 5));
        assert_eq!(req.sorting.len(), 1);
        assert_eq!(req.search.as_deref(), Some("dell"));
    }

    #[test]
    fn test_normalize_request_defaults() {
        let req = normalize_request(&json!({}), &entity());
        assert_eq!(req.condition_logic, ConditionLogic::And);
        assert!(req.conditions.is_empty());
        assert_eq!(req.pagination, PaginationSpec::new(1, 20));
        assert!(req.sorting.is_empty());
        assert_eq!(req.search, None);

        // garbage pagination is clamped, not rejected
        let req = normalize_request(
            &json!({"pagination": {"currentPage": -4, "itemsPerPage": 0}, "search": "   "}),
            &entity(),
        );
        assert_eq!(req.pagination, PaginationSpec::new(1, 1));
        assert_eq!(req.search, None);

        // not even an object
        let req = normalize_request(&json!([1, 2, 3]), &entity());
        assert!(req.conditions.is_empty());
    }
}
