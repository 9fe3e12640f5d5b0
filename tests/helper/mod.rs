//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod index;

pub use index::{index_body, monitor_for, read_snapshot};
