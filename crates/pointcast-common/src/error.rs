//! Error types for the pointcast core.

use thiserror::Error;

/// Result type alias using PointcastError.
pub type Result<T> = std::result::Result<T, PointcastError>;

/// Primary error type for the forecast reader core.
///
/// Two conditions that look like errors deliberately are not: a missing
/// archive chunk is served as NaN samples, and a missing static file
/// only disables elevation correction. Neither has a variant here.
#[derive(Debug, Error)]
pub enum PointcastError {
    /// The requested coordinate is not covered by any grid of the
    /// selected model. Callers translate this into "no data for this
    /// location".
    #[error("no data for this location")]
    OutsideGrid,

    /// A chunk was present but could not be decoded. Fatal for the
    /// enclosing request only; carries the chunk identity for logs.
    #[error("corrupt chunk {path}: {reason}")]
    DecodeFailure { path: String, reason: String },

    /// An upstream object-store fetch exceeded its deadline. The request
    /// fails with a retry advisory.
    #[error("fetch of {path} exceeded deadline of {deadline_secs}s")]
    Timeout { path: String, deadline_secs: u64 },

    /// The outer task was cancelled; propagated silently.
    #[error("request cancelled")]
    Cancelled,

    /// A variable name the core does not know. Programmer error, never
    /// expected at runtime.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// The model token names a domain missing from the registry.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Storage/IO error other than a plain missing object.
    #[error("storage error: {0}")]
    Storage(String),

    /// Malformed `meta.json` or chunk-file header.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// A time range that cannot be served (zero/negative dt, end before
    /// start, dt not aligned).
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),
}

impl PointcastError {
    /// Whether the caller may usefully retry the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PointcastError::Timeout { .. })
    }

    /// Create a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a DecodeFailure error.
    pub fn decode_failure(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for PointcastError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PointcastError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}
