//! Health check endpoint

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::data::SqlitePool;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Health check endpoint
///
/// Always answers 200 while the process is up; `database` reports whether a
/// trivial query succeeds.
pub async fn health(State(pool): State<SqlitePool>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check query failed");
            "unavailable"
        }
    };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
