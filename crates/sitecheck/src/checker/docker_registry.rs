use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{http, CheckError, Checker};
use crate::target::Target;
use crate::validation::validate_http_target;
use crate::CheckResult;

const API_VERSION_HEADER: &str = "Docker-Distribution-API-Version";

/// Container registry checker using the v2 API base endpoint.
///
/// Anything but a 200 from `GET {url}/v2/` is an error rather than an
/// unhealthy answer: the endpoint exists on every v2 registry, so a
/// different status means we are not talking to a registry at all.
pub struct RegistryChecker {
    client: Client,
}

impl RegistryChecker {
    pub fn new() -> Result<Self, CheckError> {
        Ok(Self { client: http::plain_client()? })
    }
}

#[async_trait]
impl Checker for RegistryChecker {
    async fn check(&self, target: &Target) -> CheckResult {
        let url = format!("{}/v2/", target.base_url());
        let response = http::get(&self.client, &url, target.timeout).await?;

        if response.status() != StatusCode::OK {
            return Err(CheckError::BadStatus(response.status().as_u16()));
        }

        let api_version = response
            .headers()
            .get(API_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unset");
        debug!(url = %url, api_version, "registry responded");

        Ok(true)
    }

    fn validate(&self, target: &Target) -> Result<(), CheckError> {
        validate_http_target(target)
    }
}
