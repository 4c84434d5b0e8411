pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::documents::DocumentService;
use crate::error::PostalError;
use crate::failure::{self, FailurePolicy};

use handlers::ApiError;

/// Shared application state injected into all handlers via axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentService,
    pub config: Arc<Config>,
    /// Decides what happens to fatal errors before they become responses.
    pub failure: Arc<dyn FailurePolicy>,
}

impl AppState {
    /// Pass `err` through the failure policy and wrap it for the response.
    pub fn fail(&self, err: PostalError) -> ApiError {
        ApiError(failure::check(self.failure.as_ref(), err))
    }
}
