//! Local snapshot of the last known version index

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use tracing::{info, warn};

use crate::version::error::StoreError;
use crate::version::types::VersionIndex;

/// What the local snapshot currently says
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalState {
    /// No usable snapshot: first run, unreadable or malformed file
    Empty,
    /// A snapshot whose first entry carries a version
    Present(VersionIndex),
}

impl LocalState {
    pub fn latest_version(&self) -> Option<&str> {
        match self {
            LocalState::Empty => None,
            LocalState::Present(index) => index.latest().map(|r| r.version.as_str()),
        }
    }
}

/// Trait for loading and replacing the local snapshot
#[cfg_attr(test, automock)]
pub trait VersionStore: Send + Sync {
    /// Load the snapshot. Never fails: anything unusable is `Empty`.
    fn load(&self) -> LocalState;

    /// Replace the snapshot with `document`, verbatim
    fn save(&self, document: &serde_json::Value) -> Result<(), StoreError>;

    /// Copy the snapshot to `target`, creating parent directories
    fn mirror_to(&self, target: &Path) -> Result<(), StoreError>;
}

/// JSON file snapshot.
///
/// Writes are not atomic; the file is a cache that the next successful fetch
/// rebuilds.
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VersionStore for FileVersionStore {
    fn load(&self) -> LocalState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Local version file not found, treating as empty state");
                return LocalState::Empty;
            }
            Err(e) => {
                warn!("Failed to read local version file {:?}: {}", self.path, e);
                return LocalState::Empty;
            }
        };

        let document: serde_json::Value = match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(e) => {
                warn!("Local version file {:?} is malformed: {}", self.path, e);
                return LocalState::Empty;
            }
        };

        // Only the first entry's version decides; other fields are read leniently
        let has_version = document
            .pointer("/versions/0/version")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|v| !v.is_empty());
        if !has_version || !document["versions"].is_array() {
            warn!("Local version file exists but contains no versions");
            return LocalState::Empty;
        }

        match VersionIndex::deserialize(&document) {
            Ok(index) => {
                info!("Local version: {}", index.versions[0].version);
                LocalState::Present(index)
            }
            Err(e) => {
                warn!("Local version file {:?} is malformed: {}", self.path, e);
                LocalState::Empty
            }
        }
    }

    fn save(&self, document: &serde_json::Value) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(document)?;
        write_creating_parents(&self.path, content.as_bytes())?;
        info!("Local version index updated: {:?}", self.path);
        Ok(())
    }

    fn mirror_to(&self, target: &Path) -> Result<(), StoreError> {
        let content = fs::read(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        write_creating_parents(target, &content)?;
        info!("Copied version index to {:?}", target);
        Ok(())
    }
}

fn write_creating_parents(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let to_store_error = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_store_error)?;
    }
    fs::write(path, content).map_err(to_store_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileVersionStore {
        FileVersionStore::new(dir.path().join("public/version-index.json"))
    }

    #[test]
    fn load_returns_empty_when_file_is_missing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load(), LocalState::Empty);
    }

    #[rstest]
    #[case("not json at all")]
    #[case(r#"{"updatedAt": 1}"#)]
    #[case(r#"{"updatedAt": 1, "versions": []}"#)]
    #[case(r#"{"versions": ["v1.0.0"]}"#)]
    #[case(r#"{"version": "v1.0.0"}"#)]
    #[case(r#"{"versions": [{"version": ""}]}"#)]
    #[case(r#"{"versions": {"0": {"version": "v1.0.0"}}}"#)]
    fn load_treats_unusable_content_as_empty(#[case] content: &str) {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), content).unwrap();

        assert_eq!(store.load(), LocalState::Empty);
    }

    #[rstest]
    #[case(json!({"updatedAt": "2025-01-01T00:00:00Z", "versions": [{"version": "v0.1.4"}]}))]
    #[case(json!({
        "updatedAt": 1735689600.5,
        "versions": [{
            "version": "v0.1.4",
            "assets": [{"name": "a.zip", "path": "a.zip", "size": 1, "lastModified": 1735689600.5}]
        }]
    }))]
    #[case(json!({"versions": [{"version": "v0.1.4", "assets": [{"name": "a.zip", "size": 1}]}]}))]
    #[case(json!({"versions": [{"version": "v0.1.4", "files": null}, "v0.1.3"]}))]
    fn load_reads_version_despite_unexpected_field_types(#[case] document: serde_json::Value) {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&document).unwrap();

        assert_eq!(store.load().latest_version(), Some("v0.1.4"));
    }

    #[test]
    fn save_creates_parent_directories_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let document = json!({
            "updatedAt": 1735689600,
            "versions": [{"version": "v0.1.4", "files": [], "assets": []}]
        });

        store.save(&document).unwrap();

        let state = store.load();
        assert_eq!(state.latest_version(), Some("v0.1.4"));
        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, document);
    }

    #[test]
    fn save_overwrites_existing_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .save(&json!({"versions": [{"version": "v0.1.0"}]}))
            .unwrap();
        store
            .save(&json!({"versions": [{"version": "v0.2.0"}]}))
            .unwrap();

        assert_eq!(store.load().latest_version(), Some("v0.2.0"));
    }

    #[test]
    fn save_fails_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("public");
        fs::write(&blocker, "file, not a directory").unwrap();

        let result = store_in(&dir).save(&json!({"versions": []}));

        assert!(matches!(result, Err(StoreError::Write { .. })));
    }

    #[test]
    fn mirror_to_copies_snapshot_bytes() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .save(&json!({"versions": [{"version": "v0.3.0"}]}))
            .unwrap();

        let target = dir.path().join("website/public/version-index.json");
        store.mirror_to(&target).unwrap();

        assert_eq!(
            fs::read(&target).unwrap(),
            fs::read(store.path()).unwrap()
        );
    }

    #[test]
    fn mirror_to_fails_without_snapshot() {
        let dir = TempDir::new().unwrap();
        let result = store_in(&dir).mirror_to(&dir.path().join("copy.json"));
        assert!(matches!(result, Err(StoreError::Read { .. })));
    }
}
