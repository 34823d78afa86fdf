use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::{
    CheckError, Checker, ConsulChecker, DockerInfoChecker, EtcdChecker, RegistryChecker,
    SubversionChecker, TelnetChecker, WebsiteChecker, DEFAULT_ATTEMPT_TIMEOUT,
};

/// Knobs for the built-in checkers
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Directory holding `cert.pem`, `key.pem` and `ca.pem` for docker/swarm
    pub docker_cert_dir: Option<PathBuf>,
    /// Bound of one docker `/info` attempt
    pub docker_attempt_timeout: Duration,
    /// Subversion client binary
    pub svn_program: PathBuf,
    /// Read poll interval of the telnet probe
    pub telnet_poll_interval: Duration,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            docker_cert_dir: DockerInfoChecker::default_cert_dir(),
            docker_attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            svn_program: PathBuf::from("svn"),
            telnet_poll_interval: super::telnet::READ_POLL_INTERVAL,
        }
    }
}

/// Mapping from a target's type string to its checker.
///
/// Built once at startup and read-only afterwards, so it is shared without
/// locking.
#[derive(Default, Clone)]
pub struct CheckerRegistry {
    checkers: HashMap<String, Arc<dyn Checker>>,
}

impl CheckerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in checker
    pub fn with_defaults(settings: RegistrySettings) -> Result<Self, CheckError> {
        let docker: Arc<dyn Checker> = Arc::new(
            DockerInfoChecker::new(settings.docker_cert_dir)
                .with_attempt_timeout(settings.docker_attempt_timeout),
        );

        Ok(Self::new()
            .register("website", WebsiteChecker::new()?)
            .register("registry", RegistryChecker::new()?)
            .register("etcd", EtcdChecker::new()?)
            .register_shared("docker", docker.clone())
            .register_shared("swarm", docker)
            .register("subversion", SubversionChecker::new(settings.svn_program))
            .register(
                "telnet",
                TelnetChecker::new().with_poll_interval(settings.telnet_poll_interval),
            )
            .register("consul", ConsulChecker::new()?))
    }

    pub fn register(self, kind: impl Into<String>, checker: impl Checker + 'static) -> Self {
        self.register_shared(kind, Arc::new(checker))
    }

    /// Register one checker instance under a type name; several names may
    /// share an instance and its cached resources
    pub fn register_shared(mut self, kind: impl Into<String>, checker: Arc<dyn Checker>) -> Self {
        self.checkers.insert(kind.into(), checker);
        self
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Checker>> {
        self.checkers.get(kind).cloned()
    }

    /// Registered type names, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.checkers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for CheckerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckerRegistry").field("kinds", &self.kinds()).finish()
    }
}
