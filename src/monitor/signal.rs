//! Downstream signal for the external publishing step
//!
//! The publishing step (branch, commit, pull request) is not part of this
//! crate. It consumes either the `key=value` lines appended to the output file
//! (the GitHub Actions `$GITHUB_OUTPUT` convention) or the JSON summary.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::monitor::orchestrator::CheckOutcome;
use crate::version::error::StoreError;

static BRANCH_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9.-]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub update_needed: bool,
    pub version: String,
    pub previous_version: Option<String>,
    /// Suggested branch for the update
    pub branch: String,
    /// Suggested commit and pull request title
    pub title: String,
    pub source: String,
    pub checked_at: String,
}

impl Signal {
    pub fn new(outcome: &CheckOutcome, source: &str, checked_at: DateTime<Utc>) -> Self {
        Self {
            update_needed: outcome.update_needed,
            version: outcome.version.clone(),
            previous_version: outcome.previous_version.clone(),
            branch: branch_name(&outcome.version),
            title: format!("chore: update version to {}", outcome.version),
            source: source.to_string(),
            checked_at: checked_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// One `key=value` line per field. Line breaks inside values are
    /// replaced so a value can never start a new key.
    pub fn to_output_lines(&self) -> String {
        let fields = [
            ("update_needed", self.update_needed.to_string()),
            ("version", self.version.clone()),
            (
                "previous_version",
                self.previous_version.clone().unwrap_or_default(),
            ),
            ("branch", self.branch.clone()),
            ("title", self.title.clone()),
            ("source", self.source.clone()),
            ("checked_at", self.checked_at.clone()),
        ];

        fields
            .iter()
            .map(|(key, value)| format!("{}={}\n", key, value.replace(['\r', '\n'], " ")))
            .collect()
    }

    /// Append the output lines to `path`, creating it when missing
    pub fn append_to(&self, path: &Path) -> Result<(), StoreError> {
        let to_store_error = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(to_store_error)?;
        file.write_all(self.to_output_lines().as_bytes())
            .map_err(to_store_error)?;

        info!("Wrote update signal to {:?}", path);
        Ok(())
    }
}

/// `update-version-<version>` with characters outside `[A-Za-z0-9.-]`
/// replaced by `-`.
pub fn branch_name(version: &str) -> String {
    format!("update-version-{}", BRANCH_UNSAFE.replace_all(version, "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use tempfile::TempDir;

    fn outcome(update_needed: bool, version: &str, previous: Option<&str>) -> CheckOutcome {
        CheckOutcome {
            update_needed,
            version: version.to_string(),
            previous_version: previous.map(str::to_string),
        }
    }

    fn checked_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[rstest]
    #[case("v1.2.3", "update-version-v1.2.3")]
    #[case("v1.2.3-beta.1", "update-version-v1.2.3-beta.1")]
    #[case("v1.2.3+build/7 x", "update-version-v1.2.3-build-7-x")]
    fn branch_name_sanitizes_version(#[case] version: &str, #[case] expected: &str) {
        assert_eq!(branch_name(version), expected);
    }

    #[test]
    fn to_output_lines_lists_every_field() {
        let signal = Signal::new(
            &outcome(true, "v0.2.0", Some("v0.1.0")),
            "https://dl.example.com/index.json",
            checked_at(),
        );

        assert_eq!(
            signal.to_output_lines(),
            "update_needed=true\n\
             version=v0.2.0\n\
             previous_version=v0.1.0\n\
             branch=update-version-v0.2.0\n\
             title=chore: update version to v0.2.0\n\
             source=https://dl.example.com/index.json\n\
             checked_at=2026-01-02T03:04:05Z\n"
        );
    }

    #[test]
    fn to_output_lines_neutralizes_line_breaks() {
        let signal = Signal::new(&outcome(true, "v1\nupdate_needed=false", None), "src", checked_at());

        let lines = signal.to_output_lines();

        assert!(lines.starts_with("update_needed=true\n"));
        assert!(lines.contains("version=v1 update_needed=false\n"));
        assert_eq!(lines.lines().filter(|l| l.starts_with("update_needed=")).count(), 1);
    }

    #[test]
    fn append_to_keeps_existing_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "earlier=1\n").unwrap();

        Signal::new(&outcome(false, "v1.0.0", Some("v1.0.0")), "src", checked_at())
            .append_to(&path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier=1\nupdate_needed=false\n"));
    }

    #[test]
    fn serializes_as_camel_case_json() {
        let signal = Signal::new(&outcome(true, "v1.0.0", None), "src", checked_at());
        let value = serde_json::to_value(&signal).unwrap();

        assert_eq!(value["updateNeeded"], true);
        assert_eq!(value["previousVersion"], serde_json::Value::Null);
        assert_eq!(value["branch"], "update-version-v1.0.0");
    }
}
