use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{http, CheckError, Checker};
use crate::target::Target;
use crate::validation::validate_http_target;
use crate::CheckResult;

/// One entry of a Consul health-check listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConsulCheck {
    #[serde(rename = "CheckID", default)]
    check_id: String,
    #[serde(default)]
    status: String,
}

/// Consul checker: the target URL is a health endpoint such as
/// `/v1/health/checks/{service}` and the first listed check must be passing
pub struct ConsulChecker {
    client: Client,
}

impl ConsulChecker {
    pub fn new() -> Result<Self, CheckError> {
        Ok(Self { client: http::plain_client()? })
    }
}

#[async_trait]
impl Checker for ConsulChecker {
    async fn check(&self, target: &Target) -> CheckResult {
        let response = http::get(&self.client, &target.url, target.timeout).await?;
        if response.status() != StatusCode::OK {
            return Ok(false);
        }

        let checks: Vec<ConsulCheck> = http::decode_json(response).await?;
        let first = checks.first().ok_or(CheckError::EmptyResponse)?;
        debug!(check = %first.check_id, status = %first.status, "consul check");

        Ok(first.status == "passing")
    }

    fn validate(&self, target: &Target) -> Result<(), CheckError> {
        validate_http_target(target)
    }
}
