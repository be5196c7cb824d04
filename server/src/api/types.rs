//! Shared API types
//!
//! Error responses, pagination validators and `order_by` parsing used by the
//! entity endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use validator::ValidationError;

pub use crate::core::constants::MAX_PAGE_LIMIT;
use crate::data::error::DataError;
use crate::domain::filter::{SortDirection, SortSpec};

/// Maximum page number to prevent expensive OFFSET queries
pub const MAX_PAGE: u32 = 10_000;
/// Default page number
pub const DEFAULT_PAGE: u32 = 1;

/// Validator function for page parameter
pub fn validate_page(page: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::new("page_min").with_message("Page must be >= 1".into()));
    }
    if page > MAX_PAGE {
        return Err(ValidationError::new("page_max").with_message(
            format!("Page must be <= {} to prevent expensive queries", MAX_PAGE).into(),
        ));
    }
    Ok(())
}

/// Validator function for limit parameter
pub fn validate_limit(limit: u32) -> Result<(), ValidationError> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ValidationError::new("limit_range")
            .with_message(format!("Limit must be between 1 and {}", MAX_PAGE_LIMIT).into()));
    }
    Ok(())
}

pub fn default_page() -> u32 {
    DEFAULT_PAGE
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn from_data(e: DataError) -> Self {
        tracing::error!(error = %e, "Data error");
        if e.is_unavailable() {
            Self::service_unavailable("Database is unavailable")
        } else {
            Self::internal("Database operation failed")
        }
    }

    pub fn unknown_entity(name: &str) -> Self {
        Self::not_found("ENTITY_NOT_FOUND", format!("Unknown entity: {}", name))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

/// Parse `order_by=name:desc,price` into sort specs, priority by position.
///
/// A bare column sorts ascending. Whether the column may be sorted on is
/// decided later against the entity config.
pub fn parse_order_by(s: &str) -> Result<Vec<SortSpec>, ApiError> {
    let mut specs = Vec::new();
    for (position, item) in s.split(',').map(str::trim).filter(|i| !i.is_empty()).enumerate() {
        let parts: Vec<&str> = item.split(':').map(str::trim).collect();
        let (column, direction) = match parts.as_slice() {
            [col] => (*col, SortDirection::Asc),
            [col, dir] if dir.eq_ignore_ascii_case("asc") => (*col, SortDirection::Asc),
            [col, dir] if dir.eq_ignore_ascii_case("desc") => (*col, SortDirection::Desc),
            _ => {
                return Err(ApiError::bad_request(
                    "INVALID_ORDER",
                    "Invalid order_by format. Use 'column' or 'column:asc' or 'column:desc'",
                ));
            }
        };
        if column.is_empty() {
            return Err(ApiError::bad_request(
                "INVALID_ORDER_COLUMN",
                "order_by column cannot be empty",
            ));
        }
        let priority = i32::try_from(position).unwrap_or(i32::MAX);
        specs.push(SortSpec::new(column, direction, priority));
    }
    Ok(specs)
}
