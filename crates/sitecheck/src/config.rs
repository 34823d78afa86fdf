//! Target list loading.
//!
//! The file is TOML: an optional `default_timeout` (seconds) followed by
//! `[[site]]` groups. Every URL of a group becomes one [`Target`].
//!
//! ```toml
//! default_timeout = 20
//!
//! [[site]]
//! name = "Registry"
//! type = "registry"
//! description = "internal image registry"
//! urls = ["https://registry.example.com"]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::target::Target;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("site #{index}: {reason}")]
    Invalid { index: usize, reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    default_timeout: Option<u64>,
    #[serde(default, rename = "site")]
    sites: Vec<SiteConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SiteConfig {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    urls: Vec<String>,
}

impl SiteConfig {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid { index, reason: reason.to_string() };

        if self.name.trim().is_empty() {
            return Err(invalid("missing name"));
        }
        if self.kind.trim().is_empty() {
            return Err(invalid("missing type"));
        }
        if self.urls.is_empty() {
            return Err(invalid("no urls"));
        }
        if self.urls.iter().any(|u| u.trim().is_empty()) {
            return Err(invalid("empty url"));
        }
        Ok(())
    }
}

/// Parse a config document into targets, in file order.
///
/// A missing or zero timeout falls back to the file's `default_timeout`,
/// then to `default_timeout`.
pub fn parse_targets(text: &str, default_timeout: Duration) -> Result<Vec<Target>, ConfigError> {
    let file: ConfigFile = toml::from_str(text)?;

    let fallback = file
        .default_timeout
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(default_timeout);

    let mut targets = Vec::new();
    for (index, site) in file.sites.into_iter().enumerate() {
        site.validate(index)?;

        let timeout = site
            .timeout
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(fallback);

        for url in &site.urls {
            let mut target = Target::new(site.name.trim(), site.kind.trim(), url.trim(), timeout);
            target.description = site.description.clone().filter(|d| !d.is_empty());
            targets.push(target);
        }
    }

    Ok(targets)
}

/// Read and parse a config file
pub fn load_targets(path: impl AsRef<Path>, default_timeout: Duration) -> Result<Vec<Target>, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

    parse_targets(&text, default_timeout).inspect_err(|e| {
        error!(path = %path.display(), error = %e, "failed to parse config file");
    })
}

/// A config file reloaded whenever its modification time changes
#[derive(Debug)]
pub struct ConfigSource {
    path: PathBuf,
    default_timeout: Duration,
    loaded_modified: Option<SystemTime>,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>, default_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            default_timeout,
            loaded_modified: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// New targets when the file changed since the last successful load,
    /// `None` when it did not. A failed load keeps the previous state so the
    /// next call retries.
    pub fn reload_if_changed(&mut self) -> Result<Option<Vec<Target>>, ConfigError> {
        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|source| ConfigError::Read { path: self.path.clone(), source })?;

        if self.loaded_modified == Some(modified) {
            return Ok(None);
        }

        info!(path = %self.path.display(), "reading config");
        let targets = load_targets(&self.path, self.default_timeout)?;
        self.loaded_modified = Some(modified);

        Ok(Some(targets))
    }
}
