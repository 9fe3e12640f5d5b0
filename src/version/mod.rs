//! Version layer for release change detection
//!
//! This module provides fetching, storing, and comparing the versions listed in
//! the published desktop version index.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│   Monitor   │◀────│    Store    │
//! │  (remote)   │     │  (decide)   │     │   (local)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │    Retry    │     │   Semver    │
//! │  (backoff)  │     │(version cmp)│
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`source`]: Source trait for fetching the remote version index
//! - [`sources`]: Concrete sources (HTTP)
//! - [`retry`]: Bounded retry loop with exponential backoff
//! - [`store`]: Local JSON snapshot of the last known index
//! - [`semver`]: Lenient version parsing and release ordering
//! - [`assets`]: Platform classification of release assets
//! - [`types`]: Index document types like `VersionIndex`
//! - [`error`]: Error types for fetch and store operations

pub mod assets;
pub mod error;
pub mod retry;
pub mod semver;
pub mod source;
pub mod sources;
pub mod store;
pub mod types;
