use crate::analytics::{self, AnalyticsState};
use crate::health::{self, HealthState};
use crate::hello::{self, HelloState};
use crate::openapi::{ApiDoc, OPENAPI_JSON_PATH, SWAGGER_UI_PATH};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Assemble the HTTP surface. Every handle is built by the caller and passed in.
pub fn build_router(
    analytics_state: Arc<AnalyticsState>,
    hello_state: Arc<HelloState>,
    health_state: Arc<HealthState>,
) -> Router {
    // ── Health route ──
    let health_route = Router::new()
        .route("/health", get(health::health))
        .with_state(health_state);

    // ── Tracked demo endpoint ──
    let hello_routes = Router::new()
        .route("/api/helloWorld", get(hello::hello_world))
        .with_state(hello_state);

    // ── Analytics routes (time range validated by the `TimeRange` extractor) ──
    let analytics_routes = Router::new()
        .route(
            "/api/analytics/logs",
            get(analytics::handler::list_logs),
        )
        .route("/api/analytics/counts", get(analytics::handler::counts))
        .route(
            "/api/analytics/graphData",
            get(analytics::handler::graph_data),
        )
        .with_state(analytics_state);

    // Open CORS, read-only methods
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .merge(health_route)
        .merge(hello_routes)
        .merge(analytics_routes)
        // Swagger UI
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .layer(cors)
}
