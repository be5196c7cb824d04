//! HTTP middleware (CORS, fallback)

use axum::extract::Request;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::types::ApiError;
use crate::core::config::is_all_interfaces;

/// Origins a browser frontend may call from
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    pub fn new(host: &str, port: u16) -> Self {
        let is_all = is_all_interfaces(host);
        let hosts: Vec<&str> = if is_all || host == "127.0.0.1" || host == "localhost" {
            vec!["localhost", "127.0.0.1"]
        } else {
            vec![host]
        };

        let mut origins = Vec::new();
        for h in &hosts {
            origins.push(format!("http://{}:{}", h, port));
            origins.push(format!("http://{}", h));
        }

        if is_all && let Ok(interfaces) = local_ip_address::list_afinet_netifas() {
            for (_, ip) in interfaces
                .iter()
                .filter(|(_, ip)| ip.is_ipv4() && !ip.is_loopback())
            {
                origins.push(format!("http://{}:{}", ip, port));
            }
        }

        Self { origins }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    fn as_header_values(&self) -> Vec<HeaderValue> {
        self.origins.iter().filter_map(|o| o.parse().ok()).collect()
    }
}

/// CORS for the read-only entity API
pub fn cors(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.as_header_values()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
        ])
}

/// Fallback for unknown routes
pub async fn handle_404(req: Request) -> Response {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404] No route");
    ApiError::not_found("ROUTE_NOT_FOUND", format!("No route for {}", req.uri().path()))
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;

    #[test]
    fn test_localhost_origins() {
        let allowed = AllowedOrigins::new("127.0.0.1", 5390);
        assert!(allowed.is_allowed("http://localhost:5390"));
        assert!(allowed.is_allowed("http://127.0.0.1:5390"));
        assert!(allowed.is_allowed("http://localhost"));
        assert!(!allowed.is_allowed("http://evil.example:5390"));
    }

    #[test]
    fn test_specific_host_origins() {
        let allowed = AllowedOrigins::new("assets.internal", 8080);
        assert!(allowed.is_allowed("http://assets.internal:8080"));
        assert!(!allowed.is_allowed("http://localhost:8080"));
    }

    #[tokio::test]
    async fn test_handle_404() {
        let req = axum::http::Request::builder()
            .uri("/nowhere")
            .body(Body::empty())
            .unwrap();
        let response = handle_404(req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
