//! Fail-fast policy for errors that the service cannot recover from.
//!
//! Backend, codec and environment failures are handed to a [`FailurePolicy`]
//! before the router answers. Production deployments choose between ending
//! the process and answering with a 5xx; tests install [`RecordFailures`] to
//! observe what would have been fatal.

use std::sync::{Arc, Mutex};

use crate::config::FatalMode;
use crate::error::PostalError;

pub trait FailurePolicy: Send + Sync {
    /// Called once for every fatal error. Implementations may not return.
    fn on_fatal(&self, err: &PostalError);
}

/// Write the error to stderr and terminate with status 1.
pub struct ExitOnFatal;

impl FailurePolicy for ExitOnFatal {
    fn on_fatal(&self, err: &PostalError) {
        tracing::error!(error = %err, "fatal error, exiting");
        eprintln!("Fatal error: {err}");
        std::process::exit(1);
    }
}

/// Log the error and let the caller build an error response.
pub struct RespondOnFatal;

impl FailurePolicy for RespondOnFatal {
    fn on_fatal(&self, err: &PostalError) {
        tracing::error!(error = %err, status = err.status_code(), "fatal backend error");
    }
}

/// Keep fatal errors in memory for later inspection.
#[derive(Default)]
pub struct RecordFailures {
    seen: Mutex<Vec<String>>,
}

impl RecordFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of every fatal error seen so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FailurePolicy for RecordFailures {
    fn on_fatal(&self, err: &PostalError) {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.push(err.to_string());
    }
}

/// Build the policy selected in `server.on_fatal`.
pub fn from_mode(mode: FatalMode) -> Arc<dyn FailurePolicy> {
    match mode {
        FatalMode::Exit => Arc::new(ExitOnFatal),
        FatalMode::Respond => Arc::new(RespondOnFatal),
    }
}

/// Route `err` through `policy` when it is fatal, then hand it back.
pub fn check(policy: &dyn FailurePolicy, err: PostalError) -> PostalError {
    if err.is_fatal() {
        policy.on_fatal(&err);
    }
    err
}
