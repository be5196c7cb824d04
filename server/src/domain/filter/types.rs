//! Filter condition model
//!
//! Canonical value objects produced by the normalizer and consumed by the
//! compiler. Every string vocabulary maps through a total function, so
//! deserializing these types never fails on an unknown spelling.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::{normalize_field_type, normalize_operator};
use crate::core::constants::DEFAULT_ITEMS_PER_PAGE;

/// Type of the column a condition targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Select,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Select => "select",
            Self::Boolean => "boolean",
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        normalize_field_type(&raw)
    }
}

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FilterOperator {
    Equals,
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    Between,
}

impl FilterOperator {
    /// Canonical spelling, accepted back by the normalizer
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Between => "between",
        }
    }
}

impl From<String> for FilterOperator {
    fn from(raw: String) -> Self {
        normalize_operator(&raw)
    }
}

/// How conditions in one request are joined together
///
/// `Contains` behaves like `And` for positional joining, except that
/// CONTAINS conditions over text fields attach with OR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ConditionLogic {
    #[default]
    And,
    Or,
    Contains,
}

impl ConditionLogic {
    /// Parse the canonical three-valued spelling. Unknown input is AND.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "or" => Self::Or,
            "contains" => Self::Contains,
            _ => Self::And,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Contains => "contains",
        }
    }
}

impl From<String> for ConditionLogic {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc`/`descending` in any case is DESC; everything else is ASC
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "desc" | "descending" => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl From<String> for SortDirection {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// One canonical filter condition
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Column name, or a dotted path into a joined relation (`unit.name`)
    pub field: String,
    pub field_type: FieldType,
    pub operator: FilterOperator,
    /// Always a list. Empty means the condition contributes nothing.
    pub value: Vec<Value>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Column-header sort hint
    pub sort: Option<SortDirection>,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, field_type: FieldType, operator: FilterOperator) -> Self {
        Self {
            field: field.into(),
            field_type,
            operator,
            value: Vec::new(),
            date_from: None,
            date_to: None,
            sort: None,
        }
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.value = values.into_iter().collect();
        self
    }

    pub fn with_date_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.date_from = Some(from.into());
        self.date_to = Some(to.into());
        self
    }

    /// Both date bounds, when the field is a DATE and both are present
    pub fn date_bounds(&self) -> Option<(&str, &str)> {
        if self.field_type != FieldType::Date {
            return None;
        }
        match (self.date_from.as_deref(), self.date_to.as_deref()) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
    /// Lower is applied first
    pub priority: i32,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection, priority: i32) -> Self {
        Self {
            field: field.into(),
            direction,
            priority,
        }
    }
}

/// Requested page window. Totals are computed by
/// [`PaginationMeta`](super::pagination::PaginationMeta), never read from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSpec {
    pub current_page: u32,
    pub items_per_page: u32,
}

impl PaginationSpec {
    pub fn new(current_page: u32, items_per_page: u32) -> Self {
        Self {
            current_page: current_page.max(1),
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.current_page.saturating_sub(1)) * u64::from(self.items_per_page)
    }
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self::new(1, DEFAULT_ITEMS_PER_PAGE)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    pub condition_logic: ConditionLogic,
    pub conditions: Vec<FilterCondition>,
    pub pagination: PaginationSpec,
    pub sorting: Vec<SortSpec>,
    pub search: Option<String>,
}
