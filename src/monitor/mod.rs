//! Monitor layer: runs a check and reports its result
//!
//! # Modules
//!
//! - [`orchestrator`]: `VersionMonitor` state machine deciding whether an update is needed
//! - [`signal`]: Machine-readable result for the external publishing step

pub mod orchestrator;
pub mod signal;

pub use orchestrator::{CheckOutcome, MonitorError, MonitorState, VersionMonitor};
pub use signal::Signal;
