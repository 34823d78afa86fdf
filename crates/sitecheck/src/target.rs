use std::fmt;
use std::time::Duration;

/// A configured service instance to be probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Display name, shared by every URL of a configured site
    pub name: String,

    /// Type string selecting the checker (e.g. `website`, `telnet`)
    pub kind: String,

    /// Address handed to the checker, a URL or `host:port` for telnet
    pub url: String,

    /// Upper bound for one probe of this target
    pub timeout: Duration,

    /// Free-form description shown on the dashboard
    pub description: Option<String>,
}

impl Target {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            url: url.into(),
            timeout,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// URL with any trailing slash removed, for appending API paths
    pub(crate) fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.name, self.kind, self.url)
    }
}
