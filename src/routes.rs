use crate::community_handler;
use crate::handlers::{self, AppState};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request size limit for every `/api` route.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Serves the OpenAPI specification YAML file.
///
/// Returns 404 when `openapi.yml` is not present in the working directory.
async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "OpenAPI spec not found").into_response(),
    }
}

/// Serves a Swagger UI page pointed at `/api-docs/openapi.yml`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Crop Advisor API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({ url: "/api-docs/openapi.yml", dom_id: '#swagger-ui' });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Builds the full application router.
///
/// `/` and `/health` bypass the rate limiter; everything under `/api` is
/// limited to 10 req/sec per client IP (burst 20) and 1 MB bodies.
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let api_routes = Router::new()
        // API documentation
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(serve_openapi_spec))
        // Crop recommendation
        .route("/api/model-info", get(handlers::model_info))
        .route("/api/detect-soil", post(handlers::detect_soil))
        .route("/api/weather", post(handlers::weather))
        .route("/api/recommend", post(handlers::recommend))
        .route("/api/recommend-manual", post(handlers::recommend_manual))
        .route(
            "/api/recommend-from-location",
            post(handlers::recommend_from_location),
        )
        // Translation
        .route("/api/translate", post(community_handler::translate))
        .route(
            "/api/translate/languages",
            get(community_handler::supported_languages),
        )
        // Community
        .route("/api/feedback", post(community_handler::submit_feedback))
        .route("/api/feedback/stats", get(community_handler::feedback_stats))
        .route("/api/community-post", post(community_handler::create_post))
        .route("/api/community-posts", get(community_handler::list_posts))
        .route(
            "/api/community-posts/recent",
            get(community_handler::recent_posts),
        )
        // Farmer profiles
        .route("/api/profile/save", post(community_handler::save_profile))
        .route("/api/profile/:user_id", get(community_handler::get_profile))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    let app = Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Ok(app)
}
