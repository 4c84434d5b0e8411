//! Application startup and bootstrap logic.
//!
//! Kept out of `main.rs` so the wiring can be tested under `cargo test --lib`
//! with an injected backend instead of a live Elasticsearch.

use std::sync::Arc;

use axum::Router;

use crate::backend::{ElasticBackend, SearchBackend};
use crate::config::Config;
use crate::documents::DocumentService;
use crate::error::Result;
use crate::failure::{self, FailurePolicy};
use crate::server::routes::build_router;
use crate::server::AppState;

/// Resolve the configuration file path.
///
/// Priority:
/// 1. `POSTAL_SEARCH_CONFIG` environment variable
/// 2. `./postal-search.toml` if it exists
/// 3. None (use defaults)
pub fn resolve_config_path() -> Option<String> {
    std::env::var("POSTAL_SEARCH_CONFIG").ok().or_else(|| {
        let default = "postal-search.toml";
        std::path::Path::new(default)
            .exists()
            .then(|| default.to_string())
    })
}

/// Build the application router against the Elasticsearch backend named in
/// `config.backend`, with the failure policy from `config.server.on_fatal`.
pub async fn build_app(config: Config) -> Result<Router> {
    let backend: Arc<dyn SearchBackend> = Arc::new(ElasticBackend::from_config(&config.backend)?);
    let policy = failure::from_mode(config.server.on_fatal);
    build_app_with(config, backend, policy).await
}

/// Build the application router around an injected backend and policy.
///
/// This function:
/// - Initializes metrics
/// - Wraps the backend in a `DocumentService`
/// - Ensures the index exists (when `backend.create_index_on_startup`)
/// - Builds `AppState` and the axum `Router`
pub async fn build_app_with(
    config: Config,
    backend: Arc<dyn SearchBackend>,
    policy: Arc<dyn FailurePolicy>,
) -> Result<Router> {
    tracing::info!("postal-search starting");
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        entrypoint = %config.backend.entrypoint,
        index = %config.backend.index,
        doc_type = ?config.backend.doc_type,
        on_fatal = ?config.server.on_fatal,
        cors_origin = %config.server.cors_origin,
        "configuration loaded"
    );

    crate::metrics::init();

    let documents =
        DocumentService::new(backend).with_doc_type(config.backend.doc_type.clone());

    if config.backend.create_index_on_startup {
        match documents.ensure_index().await {
            Ok(true) => tracing::info!(index = documents.index_name(), "created index"),
            Ok(false) => tracing::info!(index = documents.index_name(), "index already present"),
            Err(e) => return Err(failure::check(policy.as_ref(), e)),
        }
    }

    let state = AppState {
        documents,
        config: Arc::new(config),
        failure: policy,
    };

    Ok(build_router(state))
}
