//! Release change detection for a published version index
//!
//! Fetches the remote index, compares its current release with the local
//! snapshot, refreshes the snapshot when the release moved, and reports the
//! result for an external publishing step.
//!
//! # Modules
//!
//! - [`config`]: Configuration built from environment variables
//! - [`logging`]: Tracing subscriber setup
//! - [`monitor`]: The change detector and its downstream signal
//! - [`version`]: Fetching, storing, and comparing versions

pub mod config;
pub mod logging;
pub mod monitor;
pub mod version;
