use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{http, CheckError, Checker};
use crate::target::Target;
use crate::validation::validate_http_target;
use crate::CheckResult;

/// Plain website checker: healthy iff `GET {url}` answers 200
pub struct WebsiteChecker {
    client: Client,
}

impl WebsiteChecker {
    pub fn new() -> Result<Self, CheckError> {
        Ok(Self { client: http::plain_client()? })
    }
}

#[async_trait]
impl Checker for WebsiteChecker {
    async fn check(&self, target: &Target) -> CheckResult {
        let response = http::get(&self.client, &target.url, target.timeout).await?;
        let status = response.status();
        debug!(url = %target.url, status = %status, "website responded");

        Ok(status == StatusCode::OK)
    }

    fn validate(&self, target: &Target) -> Result<(), CheckError> {
        validate_http_target(target)
    }
}
