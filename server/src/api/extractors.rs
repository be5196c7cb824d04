//! Path and validation extractors for API routes

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

/// Raw path extractor for entity routes (internal use)
#[derive(Debug, Deserialize)]
struct EntityPathRaw {
    entity: String,
}

/// Validated entity path extractor.
///
/// Extracts `entity` from the URL and checks its shape. Whether the entity
/// is configured is up to the handler.
#[derive(Debug)]
pub struct EntityPath {
    pub entity: String,
}

/// Validate entity name: 1-64 chars, alphanumeric + dash/underscore
pub fn is_valid_entity_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl<S> FromRequestParts<S> for EntityPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<EntityPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_entity_name(&raw.entity) {
            return Err(ValidationRejection::InvalidEntityName);
        }

        Ok(Self { entity: raw.entity })
    }
}

/// Validation rejection with structured error response
#[derive(Debug)]
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Entity name with disallowed characters
    InvalidEntityName,
    /// Failed to parse query string
    Query(QueryRejection),
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Path(rejection) => (
                StatusCode::BAD_REQUEST,
                "PATH_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidEntityName => (
                StatusCode::BAD_REQUEST,
                "INVALID_ENTITY",
                "Invalid entity: must be 1-64 alphanumeric chars, dashes, or underscores"
                    .to_string(),
            ),
            Self::Query(rejection) => (
                StatusCode::BAD_REQUEST,
                "QUERY_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                "JSON_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Query extractor with automatic validation.
///
/// Deserializes query parameters and validates them using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T> Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Query)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

/// Loosely-typed JSON body.
///
/// Only the body's syntax is checked here; its shape is left to the filter
/// normalizer, which never rejects.
#[derive(Debug)]
pub struct LooseJson(pub Value);

impl<S> FromRequest<S> for LooseJson
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_entity_names() {
        assert!(is_valid_entity_name("assets"));
        assert!(is_valid_entity_name("repair-orders"));
        assert!(is_valid_entity_name("unit_2"));
    }

    #[test]
    fn test_invalid_entity_names() {
        assert!(!is_valid_entity_name(""));
        assert!(!is_valid_entity_name("assets;drop"));
        assert!(!is_valid_entity_name("a.b"));
        assert!(!is_valid_entity_name(&"x".repeat(65)));
    }

    #[test]
    fn test_rejection_status() {
        let response = ValidationRejection::InvalidEntityName.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
