//! Error taxonomy for the audit pipeline.

use std::path::PathBuf;

/// Failure of a single audit call.
///
/// Nothing in this crate retries; every variant is fatal for the call that
/// produced it and is rendered as a structured error payload by the tool layer.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The launch configuration cannot produce a usable debugging port.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The audit engine failed or produced no usable result.
    #[error("audit engine error: {0}")]
    Engine(String),

    /// The browser process could not be launched or terminated.
    #[error("browser launch error: {0}")]
    Launch(String),

    #[error("{context} ({}): {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse audit engine output: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AuditError {
    /// Whether the same call could succeed if repeated as is. No failure in
    /// this crate is transient from the pipeline's point of view.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

pub type Result<T, E = AuditError> = std::result::Result<T, E>;
