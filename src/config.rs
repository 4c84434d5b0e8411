use crate::error::{PostalError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default)]
    pub on_fatal: FatalMode,
}

/// What a fatal error does once it reaches the router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatalMode {
    /// Print to stderr and terminate the process.
    Exit,
    /// Log and answer with a 5xx JSON error.
    #[default]
    Respond,
}

impl std::str::FromStr for FatalMode {
    type Err = PostalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exit" => Ok(FatalMode::Exit),
            "respond" => Ok(FatalMode::Respond),
            other => Err(PostalError::Config(format!(
                "unknown on_fatal mode '{other}' (expected exit or respond)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_index")]
    pub index: String,
    /// Legacy mapping type (Elasticsearch 5/6). `None` targets `_doc`.
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default = "default_backend_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub refresh_on_write: bool,
    #[serde(default = "default_true")]
    pub create_index_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_host() -> String {
    std::env::var("POSTAL_SEARCH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
}
fn default_port() -> u16 {
    std::env::var("POSTAL_SEARCH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}
fn default_request_timeout() -> u64 {
    std::env::var("POSTAL_SEARCH_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30)
}
fn default_cors_origin() -> String {
    std::env::var("POSTAL_SEARCH_CORS_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:9000".to_string())
}
fn default_entrypoint() -> String {
    std::env::var("ELASTICSEARCH_ENTRYPOINT")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "http://localhost:9200".to_string())
}
fn default_index() -> String {
    std::env::var("ELASTICSEARCH_INDEX").unwrap_or_else(|_| "postal_codes".to_string())
}
fn default_backend_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    std::env::var("POSTAL_SEARCH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            cors_origin: default_cors_origin(),
            on_fatal: std::env::var("POSTAL_SEARCH_ON_FATAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            entrypoint: default_entrypoint(),
            username: std::env::var("ELASTICSEARCH_USERNAME")
                .ok()
                .filter(|s| !s.is_empty()),
            password: std::env::var("ELASTICSEARCH_PASSWORD").ok(),
            index: default_index(),
            doc_type: std::env::var("ELASTICSEARCH_TYPE")
                .ok()
                .filter(|s| !s.is_empty()),
            request_timeout_secs: default_backend_timeout(),
            refresh_on_write: false,
            create_index_on_startup: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: std::env::var("LOG_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }
}

impl Config {
    /// Load config from a TOML file, falling back to defaults.
    /// After loading, env var overrides are applied so that:
    /// env var > TOML file > defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|e| {
                    PostalError::Config(format!("failed to read config file {p}: {e}"))
                })?;
                toml::from_str(&content)
                    .map_err(|e| PostalError::Config(format!("failed to parse config: {e}")))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // Server
        if let Ok(v) = std::env::var("POSTAL_SEARCH_HOST") {
            self.server.host = v;
        }
        if let Some(v) = std::env::var("POSTAL_SEARCH_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.port = v;
        }
        if let Some(v) = std::env::var("POSTAL_SEARCH_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.server.request_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("POSTAL_SEARCH_CORS_ORIGIN") {
            self.server.cors_origin = v;
        }
        if let Ok(v) = std::env::var("POSTAL_SEARCH_ON_FATAL") {
            self.server.on_fatal = v.parse()?;
        }

        // Backend
        if let Some(v) = std::env::var("ELASTICSEARCH_ENTRYPOINT")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.backend.entrypoint = v;
        }
        if let Some(v) = std::env::var("ELASTICSEARCH_USERNAME")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.backend.username = Some(v);
        }
        if let Ok(v) = std::env::var("ELASTICSEARCH_PASSWORD") {
            self.backend.password = Some(v);
        }
        if let Some(v) = std::env::var("ELASTICSEARCH_INDEX")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.backend.index = v;
        }
        if let Some(v) = std::env::var("ELASTICSEARCH_TYPE")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.backend.doc_type = Some(v);
        }

        // Logging
        if let Ok(v) = std::env::var("POSTAL_SEARCH_LOG_FORMAT") {
            self.logging.format = v;
        }
        if let Some(v) = std::env::var("LOG_FILE").ok().filter(|s| !s.is_empty()) {
            self.logging.file = Some(PathBuf::from(v));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.backend.index.is_empty() {
            return Err(PostalError::Config("backend.index must not be empty".into()));
        }
        if !self.backend.entrypoint.starts_with("http://")
            && !self.backend.entrypoint.starts_with("https://")
        {
            return Err(PostalError::Config(format!(
                "backend.entrypoint must be an http(s) URL, got '{}'",
                self.backend.entrypoint
            )));
        }
        Ok(())
    }
}
