use core::error::Error;
use core::fmt::{self, Display, Formatter};

/// The upstream services devstats depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    GitHub,
    WakaTime,
}

impl Service {
    const fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::WakaTime => "WakaTime",
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What went wrong talking to an upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// The upstream answered with a non-success HTTP status
    Status(u16),

    /// The request never produced a response (DNS, TLS, connection, timeout)
    Transport(String),

    /// The response body did not have the expected shape
    Decode(String),
}

/// A failed call to GitHub or WakaTime.
///
/// The display text is the raw description of the failure and is returned to
/// HTTP callers verbatim. It never contains credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    service: Service,
    kind: UpstreamErrorKind,
}

impl UpstreamError {
    #[must_use]
    pub const fn status(service: Service, status: u16) -> Self {
        Self {
            service,
            kind: UpstreamErrorKind::Status(status),
        }
    }

    #[must_use]
    pub fn transport(service: Service, error: &reqwest::Error) -> Self {
        Self {
            service,
            kind: UpstreamErrorKind::Transport(describe(error)),
        }
    }

    #[must_use]
    pub fn decode(service: Service, error: &reqwest::Error) -> Self {
        Self {
            service,
            kind: UpstreamErrorKind::Decode(describe(error)),
        }
    }

    #[must_use]
    pub const fn service(&self) -> Service {
        self.service
    }

    #[must_use]
    pub const fn kind(&self) -> &UpstreamErrorKind {
        &self.kind
    }

    /// The HTTP status the upstream answered with, if it answered at all.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self.kind {
            UpstreamErrorKind::Status(status) => Some(status),
            UpstreamErrorKind::Transport(_) | UpstreamErrorKind::Decode(_) => None,
        }
    }
}

impl Display for UpstreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UpstreamErrorKind::Status(status) => write!(f, "{} API error: {status}", self.service),
            UpstreamErrorKind::Transport(message) => write!(f, "{} request failed: {message}", self.service),
            UpstreamErrorKind::Decode(message) => write!(f, "{} response could not be decoded: {message}", self.service),
        }
    }
}

impl Error for UpstreamError {}

/// Flatten an error and its sources into one line.
fn describe(error: &dyn Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let e = UpstreamError::status(Service::WakaTime, 503);
        assert_eq!(e.to_string(), "WakaTime API error: 503");
        assert_eq!(e.http_status(), Some(503));
        assert_eq!(e.service(), Service::WakaTime);
    }

    #[test]
    fn test_github_status_message() {
        let e = UpstreamError::status(Service::GitHub, 422);
        assert_eq!(e.to_string(), "GitHub API error: 422");
    }

    #[test]
    fn test_service_names() {
        assert_eq!(Service::GitHub.to_string(), "GitHub");
        assert_eq!(Service::WakaTime.to_string(), "WakaTime");
    }

    #[test]
    fn test_describe_single_error() {
        let e = std::io::Error::other("connection reset");
        assert_eq!(describe(&e), "connection reset");
    }
}
