//! Change detection between the remote index and the local snapshot

use std::cmp::Ordering;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::version::error::{FetchError, StoreError};
use crate::version::semver::compare_versions;
use crate::version::source::VersionSource;
use crate::version::store::VersionStore;
use crate::version::types::RemoteVersion;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Failed to fetch remote version: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to update local version index: {0}")]
    Store(#[from] StoreError),
}

/// Where a run currently is
///
/// ```text
/// Idle -> Fetching -> Comparing -> Unchanged -> Done
///            |                 \-> Updating  -> Done
///            \-> Failed                 \-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Fetching,
    Comparing,
    Unchanged,
    Updating,
    Done,
    Failed,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub update_needed: bool,
    /// Current version of the remote source
    pub version: String,
    /// Latest version of the local snapshot before the run
    pub previous_version: Option<String>,
}

/// Decides whether the remote index moved and refreshes the snapshot if so
pub struct VersionMonitor<S, T> {
    source: S,
    store: T,
    mirrors: Vec<PathBuf>,
    state: MonitorState,
}

impl<S: VersionSource, T: VersionStore> VersionMonitor<S, T> {
    pub fn new(source: S, store: T) -> Self {
        Self {
            source,
            store,
            mirrors: Vec::new(),
            state: MonitorState::Idle,
        }
    }

    /// Extra paths that receive a copy of the snapshot after every update
    pub fn with_mirrors(mut self, mirrors: Vec<PathBuf>) -> Self {
        self.mirrors = mirrors;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Run one check.
    ///
    /// A missing or unusable local snapshot always counts as changed. Any
    /// difference counts, including a remote older than the snapshot.
    /// Nothing is written when the versions are equal.
    pub async fn run(&mut self) -> Result<CheckOutcome, MonitorError> {
        self.transition(MonitorState::Fetching);
        let remote = match self.source.fetch_latest().await {
            Ok(remote) => remote,
            Err(e) => {
                self.transition(MonitorState::Failed);
                return Err(e.into());
            }
        };
        let local = self.store.load();

        self.transition(MonitorState::Comparing);
        let previous_version = local.latest_version().map(str::to_string);
        let update_needed = match previous_version.as_deref() {
            None => {
                info!("Empty state detected - treating as new version scenario");
                true
            }
            Some(previous) => match compare_versions(&remote.version, previous) {
                Ordering::Equal => {
                    info!("Version unchanged - no update needed");
                    false
                }
                _ => {
                    info!("Version changed: {} -> {}", previous, remote.version);
                    true
                }
            },
        };

        if update_needed {
            self.transition(MonitorState::Updating);
            if let Err(e) = self.persist(&remote) {
                error!("Failed to update local version index: {}", e);
                self.transition(MonitorState::Failed);
                return Err(e.into());
            }
        } else {
            self.transition(MonitorState::Unchanged);
        }
        self.transition(MonitorState::Done);

        Ok(CheckOutcome {
            update_needed,
            version: remote.version,
            previous_version,
        })
    }

    fn persist(&self, remote: &RemoteVersion) -> Result<(), StoreError> {
        self.store.save(&remote.raw)?;
        for mirror in &self.mirrors {
            self.store.mirror_to(mirror)?;
        }
        Ok(())
    }

    fn transition(&mut self, next: MonitorState) {
        debug!("Monitor state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
