use axum::{http::HeaderValue, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    routes,
};

use super::AppState;

/// Creates the main router: `/health` plus everything under `/api`
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .nest("/api", routes::api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// CORS for browser clients; credentials are only allowed for an explicit origin
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    use axum::http::{header, Method};

    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::MockAuthProvider, db::MockRepository, middleware::request_id::REQUEST_ID_HEADER,
        services::providers::MockMetadataProvider,
    };
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(MockRepository::new()),
            Arc::new(MockAuthProvider::new()),
            Arc::new(MockMetadataProvider::new()),
        );
        create_router(Arc::new(state))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_carries_request_id() {
        let response = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_missing_token_rejected_before_store() {
        let response = app().oneshot(get("/api/library")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app().oneshot(get("/api/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preflight_for_configured_origin() {
        let origin = "https://watchwise.example";
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/feed")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();

        let response = app()
            .layer(cors_layer(Some(origin)))
            .oneshot(request)
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], origin);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn test_any_origin_without_config() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://elsewhere.example")
            .body(Body::empty())
            .unwrap();

        let response = app().layer(cors_layer(None)).oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
