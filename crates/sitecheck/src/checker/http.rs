//! Shared HTTP plumbing for the HTTP based checkers.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;

use super::CheckError;

const USER_AGENT: &str = concat!("sitecheck/", env!("CARGO_PKG_VERSION"));

/// Client builder with the settings every probe shares.
///
/// Idle connections are never pooled so that each probe opens a fresh
/// connection and observes the current state of the remote end.
pub(crate) fn client_builder() -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(0)
}

pub(crate) fn plain_client() -> Result<Client, CheckError> {
    Ok(client_builder().build()?)
}

/// Issue a GET bounded by `timeout`
pub(crate) async fn get(client: &Client, url: &str, timeout: Duration) -> Result<Response, CheckError> {
    Ok(client.get(url).timeout(timeout).send().await?)
}

/// Read the whole body and decode it as JSON
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, CheckError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
