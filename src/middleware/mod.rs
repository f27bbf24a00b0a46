pub mod auth;

pub use auth::{auth_middleware, is_admin_or_higher, is_master, AppState, AuthUser};

use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

/// Заголовок с ключом для скачивания отчётов.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("api-key");

/// CORS для дашборда. api-key обязан быть в allow_headers, иначе preflight
/// запроса на скачивание отчёта не пройдёт.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            API_KEY_HEADER,
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn preflight_allows_api_key_header() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .header(
                        header::ACCESS_CONTROL_REQUEST_HEADERS,
                        "api-key, authorization",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert!(allowed.contains("api-key"));
        assert!(allowed.contains("authorization"));
    }
}
