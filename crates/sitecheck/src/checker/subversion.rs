use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{CheckError, Checker};
use crate::target::Target;
use crate::validation::validate_any_url;
use crate::CheckResult;

/// Subversion repository checker running `svn info {url}`.
///
/// The child is killed when the target timeout elapses, so a hung server
/// cannot keep the probe alive past its bound.
pub struct SubversionChecker {
    program: PathBuf,
}

impl Default for SubversionChecker {
    fn default() -> Self {
        Self::new("svn")
    }
}

impl SubversionChecker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

#[async_trait]
impl Checker for SubversionChecker {
    async fn check(&self, target: &Target) -> CheckResult {
        let program = self.program.display().to_string();

        let child = Command::new(&self.program)
            .arg("info")
            .arg("--non-interactive")
            .arg(&target.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CheckError::Spawn { program: program.clone(), source })?;

        let output = tokio::time::timeout(target.timeout, child.wait_with_output())
            .await
            .map_err(|_| CheckError::Timeout(target.timeout))??;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if text.is_empty() {
                text = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(CheckError::ProcessFailed { program, status: output.status, output: text });
        }

        debug!(url = %target.url, "svn info succeeded");
        Ok(true)
    }

    fn validate(&self, target: &Target) -> Result<(), CheckError> {
        validate_any_url(target)
    }
}
