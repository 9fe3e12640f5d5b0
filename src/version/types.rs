//! Version index document types
//!
//! The index is read leniently: only `versions[0].version` decides whether a
//! snapshot is usable, so any other field with an unexpected type falls back
//! to its default instead of rejecting the whole document.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    /// Path relative to the download host
    #[serde(default, deserialize_with = "lenient")]
    pub path: String,
    /// Size in bytes
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: u64,
    /// Last modification time as published (seconds, milliseconds or RFC 3339)
    #[serde(default)]
    pub last_modified: Option<serde_json::Value>,
}

/// One release entry of the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub assets: Vec<Asset>,
}

/// The version index document, newest release first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionIndex {
    #[serde(default)]
    pub updated_at: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub versions: Vec<VersionRecord>,
}

impl VersionIndex {
    /// The canonical current release (index 0)
    pub fn latest(&self) -> Option<&VersionRecord> {
        self.versions.first()
    }

    pub fn find(&self, version: &str) -> Option<&VersionRecord> {
        self.versions.iter().find(|record| record.version == version)
    }

    /// `updatedAt` as a UTC timestamp
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_ref().and_then(timestamp_utc)
    }
}

/// Read a published timestamp: Unix seconds, Unix milliseconds (values beyond
/// the seconds range), fractional seconds or an RFC 3339 string.
pub fn timestamp_utc(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => {
            let ts = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            if ts.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(ts)
            } else {
                DateTime::from_timestamp(ts, 0)
            }
        }
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Keep the entries that read as `T`, dropping the rest
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect())
}

fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .unwrap_or(0))
}

/// Version extracted from a remote response, with the full document kept
/// verbatim so it can be stored unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVersion {
    pub version: String,
    pub raw: serde_json::Value,
}

impl RemoteVersion {
    /// Extract the current version from one of the accepted response shapes:
    /// `version`, `latestVersion`, `currentVersion`, `release.version`,
    /// `versions[0].version` or a bare string at `versions[0]`.
    ///
    /// Returns `None` when the document is not an object or carries no
    /// non-empty version string.
    pub fn from_document(raw: serde_json::Value) -> Option<Self> {
        let object = raw.as_object()?;

        let version = object
            .get("version")
            .and_then(non_empty)
            .or_else(|| object.get("latestVersion").and_then(non_empty))
            .or_else(|| object.get("currentVersion").and_then(non_empty))
            .or_else(|| raw.pointer("/release/version").and_then(non_empty))
            .or_else(|| {
                let first = raw.pointer("/versions/0")?;
                first.get("version").and_then(non_empty).or(non_empty(first))
            })?
            .to_string();

        Some(Self { version, raw })
    }
}

fn non_empty(value: &serde_json::Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}
