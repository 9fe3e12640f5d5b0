//! Source trait for fetching the published version index

#[cfg(test)]
use mockall::automock;

use crate::version::error::FetchError;
use crate::version::types::RemoteVersion;

/// Trait for fetching the current release from a remote source
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Fetches the current release and the full document it came from
    ///
    /// # Returns
    /// * `Ok(RemoteVersion)` - The extracted version and the raw document
    /// * `Err(FetchError)` - If every attempt failed or the payload is unusable
    async fn fetch_latest(&self) -> Result<RemoteVersion, FetchError>;
}
