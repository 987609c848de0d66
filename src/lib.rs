pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod expenses;
pub mod gemini;
pub mod models;
pub mod routes;
pub mod state;
pub mod uploads;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::gemini::{GeminiClient, TextGenerator};
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; /api/gemini will fail");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(config.gemini.clone()));
    build_app_with_generator(pool, config, generator)
}

/// Assemble the router around an explicit text generator.
pub fn build_app_with_generator(
    pool: PgPool,
    config: Config,
    generator: Arc<dyn TextGenerator>,
) -> Router {
    let max_upload_size = config.max_upload_size;

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        generator,
    });

    // Security headers
    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    Router::new()
        .merge(routes::api_routes(max_upload_size))
        .route("/health", axum::routing::get(health))
        .layer(security_headers)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
