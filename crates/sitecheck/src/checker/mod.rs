//! Protocol checkers.
//!
//! Every supported service type implements [`Checker`]. A checker owns its
//! own timeout and retry policy; the scheduler only interprets the outcome.

mod consul;
mod docker;
mod docker_registry;
mod etcd;
mod http;
mod registry;
mod subversion;
pub mod telnet;
mod website;

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::target::Target;
use crate::CheckResult;

pub use consul::ConsulChecker;
pub use docker::{DockerInfoChecker, DEFAULT_ATTEMPT_TIMEOUT};
pub use etcd::EtcdChecker;
pub use registry::{CheckerRegistry, RegistrySettings};
pub use subversion::SubversionChecker;
pub use telnet::TelnetChecker;
pub use docker_registry::RegistryChecker;
pub use website::WebsiteChecker;

/// Reasons a probe could not determine the health of a target
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("client request: {0}")]
    Http(#[from] reqwest::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("bad status {0}")]
    BadStatus(u16),
    #[error("unmarshal: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid target {url}: {reason}")]
    InvalidTarget { url: String, reason: String },
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {output}")]
    ProcessFailed {
        program: String,
        status: std::process::ExitStatus,
        output: String,
    },
    #[error("empty response")]
    EmptyResponse,
}

impl CheckError {
    pub(crate) fn invalid(target: &Target, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            url: target.url.clone(),
            reason: reason.into(),
        }
    }
}

/// Health-check capability implemented once per protocol.
///
/// Implementations must not panic. `Ok(false)` means the service answered
/// and reported itself unhealthy; `Err` means health could not be
/// determined at all.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Probe the target, bounded by `target.timeout`
    async fn check(&self, target: &Target) -> CheckResult;

    /// Reject targets this checker can never probe, such as a telnet
    /// address without a port. Called once per target at reload.
    fn validate(&self, _target: &Target) -> Result<(), CheckError> {
        Ok(())
    }
}
