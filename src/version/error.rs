use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Request timeout ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No version found in response data")]
    NoVersion,

    #[error("Giving up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt could succeed. Malformed payloads are
    /// permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_) | FetchError::Status(_) | FetchError::Timeout { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize version index: {0}")]
    Serialize(#[from] serde_json::Error),
}
