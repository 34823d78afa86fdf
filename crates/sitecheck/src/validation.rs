//! Target address validation shared by the checkers.
//!
//! Validation runs once per target when a configuration is loaded, so a
//! malformed address is reported as a configuration error instead of failing
//! on every refresh.

use url::Url;

use crate::checker::CheckError;
use crate::target::Target;

/// Validate an HTTP/HTTPS target URL
pub fn validate_http_target(target: &Target) -> Result<(), CheckError> {
    let url = Url::parse(&target.url)
        .map_err(|e| CheckError::invalid(target, format!("invalid URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CheckError::invalid(
                target,
                format!("invalid scheme for {} checker: {other}", target.kind),
            ));
        }
    }

    if url.host_str().is_none() {
        return Err(CheckError::invalid(target, "missing host"));
    }

    if url.port() == Some(0) {
        return Err(CheckError::invalid(target, "port 0 is not valid"));
    }

    Ok(())
}

/// Validate a TCP target, expected format `host:port`
pub fn validate_tcp_target(target: &Target) -> Result<(), CheckError> {
    let Some((host, port)) = target.url.rsplit_once(':') else {
        return Err(CheckError::invalid(target, "TCP target must be in format host:port"));
    };

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(CheckError::invalid(target, "missing host"));
    }

    let port: u16 = port
        .parse()
        .map_err(|_| CheckError::invalid(target, "invalid port number"))?;
    if port == 0 {
        return Err(CheckError::invalid(target, "port 0 is not valid"));
    }

    Ok(())
}

/// Validate that the target is an absolute URL of any scheme
pub fn validate_any_url(target: &Target) -> Result<(), CheckError> {
    Url::parse(&target.url)
        .map(|_| ())
        .map_err(|e| CheckError::invalid(target, format!("invalid URL: {e}")))
}
