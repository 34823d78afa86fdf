//! Sitecheck - health probes for heterogeneous network services
//!
//! This library provides the pieces behind the sitecheck dashboard:
//! protocol specific checkers, a registry mapping configured type names to
//! checkers, and a scheduler that fans probes out concurrently and keeps a
//! status table consistent across configuration reloads.

pub mod checker;
pub mod config;
pub mod scheduler;
pub mod status;
pub mod target;
pub mod validation;

// Re-export main types
pub use checker::{CheckError, Checker, CheckerRegistry, RegistrySettings};
pub use config::{load_targets, parse_targets, ConfigError, ConfigSource};
pub use scheduler::{RefreshMode, RefreshOutcome, RefreshPhase, Scheduler};
pub use status::{StatusTable, TargetState, TargetStatus};
pub use target::Target;

/// Result type of a single probe: `Ok(true)` healthy, `Ok(false)` probed but
/// reported unhealthy, `Err` when health could not be determined.
pub type CheckResult = std::result::Result<bool, CheckError>;

/// Default per-target timeout when neither the target nor the file sets one
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default minimum interval between automatically triggered refreshes
pub const DEFAULT_DEBOUNCE_SECS: u64 = 60;
