//! Request types for the entity listing endpoints

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::api::types::{
    ApiError, MAX_PAGE_LIMIT, default_page, parse_order_by, validate_limit, validate_page,
};
use crate::core::constants::{MAX_FILTER_CONDITIONS, MAX_FILTER_JSON_SIZE};
use crate::domain::filter::normalize::{RawCondition, normalize_condition};
use crate::domain::filter::{
    EntityConfig, FilterRequest, PaginationSpec, normalize_condition_logic,
};

/// Query params for `GET /entities/{entity}/search`
#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    /// JSON array of conditions
    pub filters: Option<String>,
    /// UI match mode: `and`/`contains` match all, `or`/`equals` match any
    #[serde(rename = "match")]
    pub match_mode: Option<String>,
    pub search: Option<String>,
    /// `field[:asc|:desc],...`
    pub order_by: Option<String>,

    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,

    /// Defaults to the entity's page size
    pub limit: Option<u32>,
}

impl SearchQuery {
    pub fn into_request(self, entity: &EntityConfig) -> Result<FilterRequest, ApiError> {
        let limit = match self.limit {
            Some(limit) => {
                validate_limit(limit).map_err(|e| {
                    ApiError::bad_request(
                        "VALIDATION_ERROR",
                        e.message.map(|m| m.to_string()).unwrap_or_default(),
                    )
                })?;
                limit
            }
            None => entity.default_limit.min(MAX_PAGE_LIMIT),
        };

        let conditions = match self.filters.as_deref() {
            Some(raw) => parse_filters(raw)?
                .iter()
                .filter_map(|c| {
                    normalize_condition(&RawCondition::from_value(c), &entity.field_types)
                })
                .collect(),
            None => Vec::new(),
        };

        let condition_logic = self
            .match_mode
            .as_deref()
            .map(normalize_condition_logic)
            .unwrap_or(entity.default_logic);

        let sorting = match self.order_by.as_deref() {
            Some(raw) => parse_order_by(raw)?,
            None => Vec::new(),
        };

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let request = FilterRequest {
            condition_logic,
            conditions,
            pagination: PaginationSpec::new(self.page, limit),
            sorting,
            search,
        };
        check_condition_count(&request)?;
        Ok(request)
    }
}

/// Parse the `filters` parameter into raw condition values
pub fn parse_filters(raw: &str) -> Result<Vec<Value>, ApiError> {
    if raw.len() > MAX_FILTER_JSON_SIZE {
        return Err(ApiError::bad_request(
            "FILTERS_TOO_LARGE",
            format!("filters exceeds {} bytes", MAX_FILTER_JSON_SIZE),
        ));
    }
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(ApiError::bad_request(
            "INVALID_FILTERS",
            "filters must be a JSON array",
        )),
        Err(e) => Err(ApiError::bad_request(
            "INVALID_FILTERS",
            format!("Invalid filters JSON: {}", e),
        )),
    }
}

pub fn check_condition_count(request: &FilterRequest) -> Result<(), ApiError> {
    if request.conditions.len() > MAX_FILTER_CONDITIONS {
        return Err(ApiError::bad_request(
            "TOO_MANY_FILTERS",
            format!("At most {} conditions are allowed", MAX_FILTER_CONDITIONS),
        ));
    }
    Ok(())
}
