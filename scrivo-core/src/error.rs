use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by scrivo-core.
///
/// Variants are tagged by failure cause so consumers can pick retry and
/// messaging behavior without parsing strings. The enum is `Clone` and
/// serde-serializable: a failed submission stores its error in the session
/// snapshot, which crosses to presentation layers as plain data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ApiError {
    /// Transport-level failure: DNS, connect, timeout, dropped connection.
    #[error("network error: {0}")]
    Network(String),

    /// The service rejected the request (4xx), e.g. a non-audio upload.
    #[error("request rejected: {0}")]
    Validation(String),

    /// The service failed while processing the request (5xx).
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The reply could not be decoded, or violated response invariants.
    #[error("malformed response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
