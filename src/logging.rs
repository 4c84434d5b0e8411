//! Tracing setup and the per-component log handle.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;

/// Create (or truncate) the log file at `path`.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Span that tags every event emitted inside it with `component`.
pub fn component_span(component: &'static str) -> tracing::Span {
    tracing::info_span!("component", component)
}

/// Initialize the global tracing subscriber from logging config.
///
/// Uses `RUST_LOG` if set, otherwise `config.logging.level`. When
/// `logging.file` is set, events go to that file with source file and line
/// numbers; if the file cannot be opened, a warning is printed and events go
/// to stderr instead.
pub fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let json = config.logging.format == "json";

    let file = config.logging.file.as_deref().and_then(|path| {
        open_log_file(path)
            .map_err(|e| {
                eprintln!(
                    "warning: cannot open log file {}: {e}; logging to stderr",
                    path.display()
                );
            })
            .ok()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match (file, json) {
        (Some(file), true) => builder
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_writer(Mutex::new(file))
            .try_init(),
        (Some(file), false) => builder
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_writer(Mutex::new(file))
            .try_init(),
        (None, true) => builder.json().with_writer(std::io::stderr).try_init(),
        (None, false) => builder.with_writer(std::io::stderr).try_init(),
    };
    if let Err(e) = result {
        eprintln!("warning: tracing subscriber already installed: {e}");
    }
}
