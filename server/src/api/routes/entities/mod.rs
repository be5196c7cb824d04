//! Entity listing endpoints
//!
//! Generic listings over every configured entity: an unfiltered list, a
//! filtered page driven by a JSON body, and the same driven by query params.

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::extractors::{EntityPath, LooseJson, ValidatedQuery};
use crate::api::types::{ApiError, MAX_PAGE, MAX_PAGE_LIMIT};
use crate::data::traits::Record;
use crate::domain::filter::{
    EntityConfig, EntityRegistry, FilterService, Paginated, PaginationSpec, normalize_request,
};

use types::{SearchQuery, check_condition_count};

/// Shared state for entity endpoints
#[derive(Clone)]
pub struct EntitiesApiState {
    pub service: Arc<FilterService>,
    pub registry: Arc<EntityRegistry>,
}

impl EntitiesApiState {
    fn entity(&self, name: &str) -> Result<&EntityConfig, ApiError> {
        self.registry
            .get(name)
            .ok_or_else(|| ApiError::unknown_entity(name))
    }
}

/// Build entity API routes
pub fn routes(service: Arc<FilterService>, registry: Arc<EntityRegistry>) -> Router<()> {
    let state = EntitiesApiState { service, registry };

    Router::new()
        .route("/{entity}", get(list_entity))
        .route("/{entity}/filter", post(filter_entity))
        .route("/{entity}/search", get(search_entity))
        .with_state(state)
}

/// Every row of an entity, projected, in default order
pub async fn list_entity(
    State(state): State<EntitiesApiState>,
    path: EntityPath,
) -> Result<Json<Vec<Record>>, ApiError> {
    let entity = state.entity(&path.entity)?;
    let rows = state
        .service
        .find_all(entity, |row| entity.project(row))
        .await
        .map_err(ApiError::from_data)?;
    Ok(Json(rows))
}

/// One filtered page; the body is a loosely-typed filter request
pub async fn filter_entity(
    State(state): State<EntitiesApiState>,
    path: EntityPath,
    LooseJson(body): LooseJson,
) -> Result<Json<Paginated<Record>>, ApiError> {
    let entity = state.entity(&path.entity)?;
    let mut request = normalize_request(&body, entity);
    check_condition_count(&request)?;
    request.pagination = PaginationSpec::new(
        request.pagination.current_page.min(MAX_PAGE),
        request.pagination.items_per_page.min(MAX_PAGE_LIMIT),
    );

    let page = state
        .service
        .find_with_filters(entity, &request, |row| entity.project(row))
        .await
        .map_err(ApiError::from_data)?;
    Ok(Json(page))
}

/// One filtered page described by query params
pub async fn search_entity(
    State(state): State<EntitiesApiState>,
    path: EntityPath,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<Paginated<Record>>, ApiError> {
    let entity = state.entity(&path.entity)?;
    let request = query.into_request(entity)?;

    let page = state
        .service
        .find_with_filters(entity, &request, |row| entity.project(row))
        .await
        .map_err(ApiError::from_data)?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::SqliteDataSource;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    async fn app() -> Router {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        for stmt in [
            "CREATE TABLE units (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            "CREATE TABLE assets (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                price REAL NOT NULL,
                unit_id INTEGER,
                secret TEXT,
                deleted_at TEXT
            )",
            "INSERT INTO units VALUES (1, 'IT'), (2, 'Finance')",
            "INSERT INTO assets VALUES
                (1, 'Dell Laptop', 'active', 1200, 1, 's1', NULL),
                (2, 'HP Laptop', 'repair', 900, 2, 's2', NULL),
                (3, 'Dell Monitor', 'active', 300, 1, 's3', NULL),
                (4, 'Old Desk', 'retired', 50, 2, 's4', '2024-01-01')",
        ] {
            sqlx::query(stmt).execute(&pool).await.unwrap();
        }

        let entity: EntityConfig = serde_json::from_value(json!({
            "name": "assets",
            "table": "assets",
            "alias": "a",
            "search_fields": ["name"],
            "field_types": {"price": "number", "status": "select"},
            "default_sorting": {"field": "id"},
            "relations": [{"path": "unit", "table": "units", "columns": ["name"]}],
            "fields": ["id", "name", "status", "price", "unit.name"],
            "soft_delete_column": "deleted_at",
            "default_limit": 2
        }))
        .unwrap();

        let service = Arc::new(FilterService::new(Arc::new(SqliteDataSource::new(pool))));
        routes(service, Arc::new(EntityRegistry::new([entity])))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_entity_projects_and_scopes() {
        let (status, body) = send(app().await, get("/assets")).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            json!({"id": 1, "name": "Dell Laptop", "status": "active", "price": 1200.0,
                   "unit": {"name": "IT"}})
        );
        assert!(rows[0].get("secret").is_none());
    }

    #[tokio::test]
    async fn test_filter_entity_paged_envelope() {
        let body = json!({
            "conditionLogic": "and",
            "conditions": [{"field": "name", "operator": "contains", "value": "laptop"}],
            "pagination": {"currentPage": 1, "itemsPerPage": 1}
        });
        let (status, body) = send(app().await, post_json("/assets/filter", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], json!(1));
        assert_eq!(
            body["pagination"],
            json!({"page": 1, "limit": 1, "total": 2, "totalPages": 2,
                   "hasNext": true, "hasPrev": false,
                   "nextPage": 2, "prevPage": null, "firstPage": 1, "lastPage": 2})
        );
    }

    #[tokio::test]
    async fn test_filter_entity_tolerates_garbage_fragments() {
        let body = json!({
            "conditionLogic": 42,
            "conditions": [null, "x", {"operator": "eq"}, {"field": "status", "operator": "??", "value": ["repair"]}],
            "pagination": "nope"
        });
        let (status, body) = send(app().await, post_json("/assets/filter", body)).await;
        assert_eq!(status, StatusCode::OK);
        // unknown operator on a SELECT field is CONTAINS, i.e. membership
        assert_eq!(body["data"][0]["id"], json!(2));
        assert_eq!(body["pagination"]["limit"], json!(2));
    }

    #[tokio::test]
    async fn test_filter_entity_caps_page_and_limit() {
        let body = json!({"pagination": {"currentPage": 50_000, "itemsPerPage": 9_999}});
        let (status, body) = send(app().await, post_json("/assets/filter", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["page"], json!(MAX_PAGE));
        assert_eq!(body["pagination"]["limit"], json!(MAX_PAGE_LIMIT));
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_filter_entity_rejects_malformed_json() {
        let request = Request::builder()
            .method("POST")
            .uri("/assets/filter")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app().await, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("JSON_PARSE_ERROR"));
    }

    #[tokio::test]
    async fn test_search_entity_query_params() {
        let filters = r#"[{"field":"price","operator":"gte","value":"300"}]"#;
        let uri = format!(
            "/assets/search?filters={}&match=equals&order_by=price:desc&page=1&limit=10",
            urlencode(filters)
        );
        let (status, body) = send(app().await, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(body["pagination"]["total"], json!(3));
    }

    #[tokio::test]
    async fn test_search_entity_global_search() {
        let (status, body) = send(app().await, get("/assets/search?search=DELL")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], json!(2));
    }

    #[tokio::test]
    async fn test_search_entity_validation() {
        let (status, body) = send(app().await, get("/assets/search?page=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));

        let (status, _) = send(app().await, get("/assets/search?limit=100000")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(app().await, get("/assets/search?filters=%7Bbad")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("INVALID_FILTERS"));
    }

    #[tokio::test]
    async fn test_unknown_entity_is_404() {
        let (status, body) = send(app().await, get("/repairs")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], json!("ENTITY_NOT_FOUND"));

        let (status, _) = send(app().await, post_json("/repairs/filter", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_entity_name_is_400() {
        let (status, body) = send(app().await, get("/bad%20name")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("INVALID_ENTITY"));
    }

    #[tokio::test]
    async fn test_field_injection_is_dropped_by_allow_list() {
        let body = json!({
            "conditions": [{"field": "name\" OR 1=1 --", "operator": "eq", "value": "x"}]
        });
        let (status, body) = send(app().await, post_json("/assets/filter", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], json!(3));
    }

    fn urlencode(s: &str) -> String {
        s.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{:02X}", b),
            })
            .collect()
    }
}
