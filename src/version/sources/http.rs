//! HTTP version source

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::version::error::FetchError;
use crate::version::retry::RetryPolicy;
use crate::version::source::VersionSource;
use crate::version::types::RemoteVersion;

/// Default URL of the published desktop version index
pub const DEFAULT_SOURCE_URL: &str = "https://desktop.dl.hagicode.com/index.json";

const USER_AGENT: &str = "Version-Monitor/1.0";

/// Version source reading a JSON document over HTTP GET
pub struct HttpVersionSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpVersionSource {
    pub fn new(url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            url: url.to_string(),
            timeout,
            retry,
        })
    }

    /// One GET bounded by the per-attempt timeout.
    ///
    /// The timer cancels the attempt's token; a cancelled attempt drops the
    /// in-flight request and reports a timeout.
    async fn attempt(&self, attempt: u32) -> Result<serde_json::Value, FetchError> {
        debug!(
            "GET {} (attempt {}/{})",
            self.url,
            attempt + 1,
            self.retry.max_attempts()
        );

        let cancel = CancellationToken::new();
        let timer = tokio::spawn({
            let cancel = cancel.clone();
            let timeout = self.timeout;
            async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel();
            }
        });

        let outcome = cancel.run_until_cancelled(self.request()).await;
        timer.abort();

        outcome.unwrap_or(Err(FetchError::Timeout {
            timeout_ms: self.timeout.as_millis() as u64,
        }))
    }

    async fn request(&self) -> Result<serde_json::Value, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl VersionSource for HttpVersionSource {
    async fn fetch_latest(&self) -> Result<RemoteVersion, FetchError> {
        info!("Fetching version from: {}", self.url);

        let result = async {
            let raw = self.retry.run(|attempt| self.attempt(attempt)).await?;

            if !raw.is_object() {
                return Err(FetchError::InvalidResponse("not an object".to_string()));
            }
            RemoteVersion::from_document(raw).ok_or(FetchError::NoVersion)
        }
        .await;

        match result {
            Ok(remote) => {
                info!("Current version from source: {}", remote.version);
                Ok(remote)
            }
            Err(e) => {
                error!("Failed to fetch version data: {}", e);
                Err(e)
            }
        }
    }
}
