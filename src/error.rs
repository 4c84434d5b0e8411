use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostalError {
    // Request errors
    #[error("no search term supplied")]
    EmptyQuery,

    #[error("document not found: {id}")]
    NotFound { id: String },

    #[error("validation error: {0}")]
    Validation(String),

    // Backend errors
    #[error("index creation not acknowledged: {index}")]
    IndexNotAcknowledged { index: String },

    #[error("backend returned {status}: {reason}")]
    Backend { status: u16, reason: String },

    #[error("backend transport error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    // IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PostalError>;

impl PostalError {
    pub fn status_code(&self) -> u16 {
        match self {
            PostalError::EmptyQuery | PostalError::Validation(_) => 400,

            PostalError::NotFound { .. } => 404,

            PostalError::Backend { .. } | PostalError::Http(_) => 502,

            _ => 500,
        }
    }

    /// Whether the error escapes to the fail-fast policy.
    ///
    /// Only caller mistakes are recoverable; anything raised by the backend,
    /// the codec or the environment is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PostalError::EmptyQuery | PostalError::NotFound { .. } | PostalError::Validation(_)
        )
    }
}
