//! Shared HTTP plumbing for the upstream clients.

use super::{Service, UpstreamError};
use core::time::Duration;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

const LOG_TARGET: &str = "  upstream";

pub const USER_AGENT: &str = concat!("devstats/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client that sends `authorization` on every request and gives
/// up on any single request after `timeout`.
pub fn build(authorization: &str, timeout: Duration) -> crate::Result<reqwest::Client> {
    let mut auth_val = HeaderValue::from_str(authorization)?;
    auth_val.set_sensitive(true);

    let mut headers = HeaderMap::new();
    let _ = headers.insert(AUTHORIZATION, auth_val);

    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

/// Send a request and reject anything other than a 2xx answer.
pub async fn send(service: Service, request: reqwest::RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
    let resp = request.send().await.map_err(|e| UpstreamError::transport(service, &e))?;

    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    log::debug!(target: LOG_TARGET, "{service} answered {status}");
    Err(UpstreamError::status(service, status.as_u16()))
}

/// Join a configured base URL and an absolute API path.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(endpoint("https://api.github.com/", "/search/commits"), "https://api.github.com/search/commits");
        assert_eq!(endpoint("https://api.github.com", "/search/commits"), "https://api.github.com/search/commits");
    }

    #[test]
    fn test_build_rejects_invalid_header() {
        assert!(build("token bad\nvalue", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_log_target_is_padded() {
        assert_eq!(LOG_TARGET.len(), 10);
        assert_eq!(LOG_TARGET.trim_start(), "upstream");
    }

    #[test]
    fn test_build_accepts_token() {
        assert!(build("token abc", Duration::from_secs(1)).is_ok());
    }
}
