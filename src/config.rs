use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::version::retry::RetryPolicy;
use crate::version::sources::http::DEFAULT_SOURCE_URL;

// =============================================================================
// Defaults
// =============================================================================

/// Default per-attempt request timeout in milliseconds (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default number of fetch attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between attempts in milliseconds, doubled per retry
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Default location of the local version snapshot
pub const DEFAULT_INDEX_PATH: &str = "public/version-index.json";

/// Monitor configuration, built once and passed to the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub source_url: String,
    pub request_timeout: Duration,
    /// Total fetch attempts, at least 1
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub index_path: PathBuf,
    /// File receiving `key=value` signal lines (`GITHUB_OUTPUT`)
    pub output_file: Option<PathBuf>,
    pub mirror_paths: Vec<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            output_file: None,
            mirror_paths: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unset or empty keys keep
    /// their default; unparseable numbers keep their default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            source_url: get("VERSION_SOURCE_URL").unwrap_or(defaults.source_url),
            request_timeout: parse_number(get("REQUEST_TIMEOUT"), "REQUEST_TIMEOUT")
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            max_attempts: parse_number::<u32>(get("MAX_RETRIES"), "MAX_RETRIES")
                .map(|n| n.max(1))
                .unwrap_or(defaults.max_attempts),
            retry_base_delay: parse_number(get("RETRY_DELAY"), "RETRY_DELAY")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            index_path: get("VERSION_INDEX_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_path),
            output_file: get("GITHUB_OUTPUT").map(PathBuf::from),
            mirror_paths: get("VERSION_INDEX_MIRRORS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_base_delay)
    }
}

fn parse_number<N: std::str::FromStr>(value: Option<String>, key: &str) -> Option<N> {
    let value = value?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using default", key, value);
            None
        }
    }
}
