//! Cross-origin policy applied in front of every route.

use crate::stats::ErrorResult;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LOG_TARGET: &str = "      cors";

const ALLOWED_METHODS: &str = "GET, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";
const PREFLIGHT_MAX_AGE_SECS: &str = "86400";

/// Which browser origins may call the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorsPolicy {
    /// Any origin, answered with `Access-Control-Allow-Origin: *`
    #[default]
    Open,

    /// Only the configured origins; others are refused with 403
    OriginAllowlist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    /// Proceed, attaching this `Access-Control-Allow-Origin` value if any
    Allow(Option<HeaderValue>),
    Forbid,
}

#[derive(Debug, Clone)]
pub struct Cors {
    policy: CorsPolicy,
    allowed_origins: Vec<String>,
}

impl Cors {
    #[must_use]
    pub fn new(policy: CorsPolicy, allowed_origins: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            policy,
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
        }
    }

    fn judge(&self, origin: Option<&HeaderValue>) -> Verdict {
        match self.policy {
            CorsPolicy::Open => Verdict::Allow(Some(HeaderValue::from_static("*"))),
            CorsPolicy::OriginAllowlist => {
                // Requests without an Origin header come from non-browser clients.
                let Some(origin) = origin else {
                    return Verdict::Allow(None);
                };

                let listed = origin
                    .to_str()
                    .is_ok_and(|o| self.allowed_origins.iter().any(|allowed| allowed == o));

                if listed { Verdict::Allow(Some(origin.clone())) } else { Verdict::Forbid }
            }
        }
    }

    fn decorate(&self, headers: &mut HeaderMap, allow_origin: Option<HeaderValue>) {
        if let Some(value) = allow_origin {
            let _ = headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }

        if self.policy == CorsPolicy::OriginAllowlist {
            let _ = headers.append(VARY, HeaderValue::from_static("Origin"));
        }
    }
}

/// Middleware enforcing the CORS policy.
///
/// Runs before routing, so a refused origin never reaches a handler and no
/// upstream call is made on its behalf.
pub async fn enforce(State(cors): State<Arc<Cors>>, request: Request, next: Next) -> Response {
    let allow_origin = match cors.judge(request.headers().get(ORIGIN)) {
        Verdict::Allow(value) => value,
        Verdict::Forbid => {
            log::info!(
                target: LOG_TARGET,
                "refused {} {} from origin {:?}",
                request.method(),
                request.uri().path(),
                request.headers().get(ORIGIN)
            );
            let mut response = (StatusCode::FORBIDDEN, Json(ErrorResult::new("Forbidden"))).into_response();
            cors.decorate(response.headers_mut(), None);
            return response;
        }
    };

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        let _ = headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
        let _ = headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
        let _ = headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS));
        cors.decorate(headers, allow_origin);
        return response;
    }

    let mut response = next.run(request).await;
    cors.decorate(response.headers_mut(), allow_origin);
    response
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn allowlist() -> Cors {
        Cors::new(CorsPolicy::OriginAllowlist, ["https://hosenur.dev"])
    }

    #[test]
    fn test_open_policy_allows_everything() {
        let cors = Cors::new(CorsPolicy::Open, Vec::<String>::new());
        let evil = HeaderValue::from_static("https://evil.example");
        assert_eq!(cors.judge(Some(&evil)), Verdict::Allow(Some(HeaderValue::from_static("*"))));
        assert_eq!(cors.judge(None), Verdict::Allow(Some(HeaderValue::from_static("*"))));
    }

    #[test]
    fn test_allowlist_echoes_listed_origin() {
        let origin = HeaderValue::from_static("https://hosenur.dev");
        assert_eq!(allowlist().judge(Some(&origin)), Verdict::Allow(Some(origin.clone())));
    }

    #[test]
    fn test_allowlist_forbids_unlisted_origin() {
        let evil = HeaderValue::from_static("https://evil.example");
        assert_eq!(allowlist().judge(Some(&evil)), Verdict::Forbid);
    }

    #[test]
    fn test_allowlist_is_exact() {
        let lookalike = HeaderValue::from_static("https://hosenur.dev.evil.example");
        assert_eq!(allowlist().judge(Some(&lookalike)), Verdict::Forbid);
    }

    #[test]
    fn test_allowlist_without_origin_header() {
        assert_eq!(allowlist().judge(None), Verdict::Allow(None));
    }

    #[test]
    fn test_decorate_adds_vary_for_allowlist() {
        let mut headers = HeaderMap::new();
        allowlist().decorate(&mut headers, Some(HeaderValue::from_static("https://hosenur.dev")));
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "https://hosenur.dev");
        assert_eq!(headers.get(VARY).unwrap(), "Origin");
    }

    #[test]
    fn test_decorate_refusal_varies_on_origin() {
        let mut headers = HeaderMap::new();
        allowlist().decorate(&mut headers, None);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(headers.get(VARY).unwrap(), "Origin");
    }

    #[test]
    fn test_policy_names() {
        let p: CorsPolicy = serde_json::from_str(r#""origin-allowlist""#).unwrap();
        assert_eq!(p, CorsPolicy::OriginAllowlist);
    }
}
