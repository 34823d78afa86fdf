use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::{http, CheckError, Checker};
use crate::target::Target;
use crate::validation::validate_http_target;
use crate::CheckResult;

/// Upper bound of one `/info` attempt; attempts repeat until the target
/// timeout runs out, but only when the attempt itself timed out
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

const CERT_FILE: &str = "cert.pem";
const KEY_FILE: &str = "key.pem";
const CA_FILE: &str = "ca.pem";

/// Subset of the daemon `/info` payload we log
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DaemonInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    server_version: String,
    #[serde(default)]
    operating_system: String,
    #[serde(default)]
    containers: f64,
}

/// Docker daemon and Swarm manager checker over mutually authenticated TLS.
///
/// The client certificate, key and CA are loaded once, on first use. When
/// they cannot be loaded the problem is logged once and every probe uses a
/// plain client instead.
pub struct DockerInfoChecker {
    cert_dir: Option<PathBuf>,
    attempt_timeout: Duration,
    client: OnceCell<DaemonClient>,
}

struct DaemonClient {
    client: Client,
    authenticated: bool,
}

impl DaemonClient {
    fn plain() -> Result<Self, CheckError> {
        Ok(Self { client: http::plain_client()?, authenticated: false })
    }
}

impl DockerInfoChecker {
    pub fn new(cert_dir: Option<PathBuf>) -> Self {
        Self {
            cert_dir,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            client: OnceCell::new(),
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// `$DOCKER_CERT_PATH`, falling back to `$HOME/.docker`
    pub fn default_cert_dir() -> Option<PathBuf> {
        if let Some(path) = env::var_os("DOCKER_CERT_PATH").filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(".docker"))
    }

    /// Whether the cached client carries TLS credentials; `None` before the
    /// first probe
    pub fn is_authenticated(&self) -> Option<bool> {
        self.client.get().map(|c| c.authenticated)
    }

    async fn client(&self) -> Result<&DaemonClient, CheckError> {
        self.client.get_or_try_init(|| self.build_client()).await
    }

    async fn build_client(&self) -> Result<DaemonClient, CheckError> {
        let Some(dir) = self.cert_dir.as_deref() else {
            error!("docker certificate directory unknown (HOME not set), using unauthenticated client");
            return DaemonClient::plain();
        };

        match load_tls_client(dir).await {
            Ok(client) => {
                info!(dir = %dir.display(), "loaded docker TLS credentials");
                Ok(DaemonClient { client, authenticated: true })
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "docker TLS credentials unavailable, using unauthenticated client");
                DaemonClient::plain()
            }
        }
    }

    async fn interpret(response: Response) -> CheckResult {
        if response.status() != StatusCode::OK {
            return Err(CheckError::BadStatus(response.status().as_u16()));
        }

        let info: DaemonInfo = http::decode_json(response).await?;
        debug!(
            name = %info.name,
            version = %info.server_version,
            os = %info.operating_system,
            containers = info.containers,
            "docker daemon info"
        );

        Ok(true)
    }
}

async fn read_credential(dir: &Path, file: &str) -> Result<Vec<u8>, CheckError> {
    let path = dir.join(file);
    tokio::fs::read(&path)
        .await
        .map_err(|e| CheckError::Config(format!("reading {}: {e}", path.display())))
}

async fn load_tls_client(dir: &Path) -> Result<Client, CheckError> {
    let cert = read_credential(dir, CERT_FILE).await?;
    let key = read_credential(dir, KEY_FILE).await?;
    let ca = read_credential(dir, CA_FILE).await?;

    let mut identity_pem = cert;
    identity_pem.push(b'\n');
    identity_pem.extend_from_slice(&key);

    let identity = Identity::from_pem(&identity_pem)
        .map_err(|e| CheckError::Config(format!("client certificate: {e}")))?;
    let root = Certificate::from_pem(&ca)
        .map_err(|e| CheckError::Config(format!("CA certificate: {e}")))?;

    Ok(http::client_builder()
        .use_rustls_tls()
        .identity(identity)
        .add_root_certificate(root)
        .build()?)
}

#[async_trait]
impl Checker for DockerInfoChecker {
    async fn check(&self, target: &Target) -> CheckResult {
        let client = self.client().await?;
        let url = format!("{}/info", target.base_url());
        let deadline = Instant::now() + target.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(CheckError::Timeout(target.timeout));
            }

            match http::get(&client.client, &url, self.attempt_timeout.min(remaining)).await {
                Ok(response) => return Self::interpret(response).await,
                Err(CheckError::Http(e)) if e.is_timeout() => {
                    debug!(url = %url, "docker /info attempt timed out, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn validate(&self, target: &Target) -> Result<(), CheckError> {
        validate_http_target(target)
    }
}
