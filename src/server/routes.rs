use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers::{documents, health, metrics};
use super::middleware;
use super::AppState;

/// Builds the axum router with all routes, middleware, and shared state.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/", get(documents::ping))
        .route(
            "/search",
            get(documents::search).post(documents::create_document),
        )
        .route(
            "/search/:id",
            get(documents::read_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/healthz", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(axum::middleware::from_fn(middleware::http_metrics))
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id))
        .with_state(state)
}

/// Browser callers are limited to one origin and three request headers.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT]);
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            tracing::warn!(origin, error = %e, "invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}
