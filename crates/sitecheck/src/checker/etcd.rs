use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{http, CheckError, Checker};
use crate::target::Target;
use crate::validation::validate_http_target;
use crate::CheckResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Member {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Members {
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct MemberHealth {
    #[serde(default)]
    health: String,
}

/// etcd cluster checker.
///
/// Healthy iff at least one member answers its `/health` endpoint with
/// `{"health": "true"}`. Only a failure to list the members is an error.
/// The whole check, member listing included, shares the target timeout.
pub struct EtcdChecker {
    client: Client,
}

impl EtcdChecker {
    pub fn new() -> Result<Self, CheckError> {
        Ok(Self { client: http::plain_client()? })
    }

    async fn members(&self, target: &Target, timeout: Duration) -> Result<Members, CheckError> {
        let url = format!("{}/v2/members", target.base_url());
        let response = http::get(&self.client, &url, timeout).await?;

        if response.status() != StatusCode::OK {
            return Err(CheckError::BadStatus(response.status().as_u16()));
        }

        http::decode_json(response).await
    }

    /// Health reported by one client URL of a member, `None` when the member
    /// could not be asked
    async fn member_health(&self, member: &Member, client_url: &str, timeout: Duration) -> Option<bool> {
        let url = format!("{}/health", client_url.trim_end_matches('/'));

        let response = match http::get(&self.client, &url, timeout).await {
            Ok(response) => response,
            Err(e) => {
                warn!(member = %member.id, url = %url, error = %e, "failed to check health of etcd member");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            warn!(member = %member.id, url = %url, status = %response.status(), "etcd member /health unavailable");
            return None;
        }

        match http::decode_json::<MemberHealth>(response).await {
            Ok(result) => Some(result.health == "true"),
            Err(e) => {
                warn!(member = %member.id, url = %url, error = %e, "failed to decode etcd member health");
                None
            }
        }
    }
}

#[async_trait]
impl Checker for EtcdChecker {
    async fn check(&self, target: &Target) -> CheckResult {
        let deadline = Instant::now() + target.timeout;

        let members = self.members(target, target.timeout).await?;
        debug!(target = %target.name, members = members.members.len(), "etcd membership");

        for member in &members.members {
            for client_url in &member.client_urls {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    warn!(target = %target.name, timeout = ?target.timeout, "etcd check ran out of time before a healthy member answered");
                    return Ok(false);
                }

                match self.member_health(member, client_url, remaining).await {
                    Some(true) => {
                        debug!(member = %member.id, name = %member.name, url = %client_url, "etcd member is healthy");
                        return Ok(true);
                    }
                    Some(false) => {
                        info!(member = %member.id, url = %client_url, "etcd member is unhealthy");
                        break;
                    }
                    None => continue,
                }
            }
        }

        Ok(false)
    }

    fn validate(&self, target: &Target) -> Result<(), CheckError> {
        validate_http_target(target)
    }
}
