//! Daily stats aggregation
//!
//! Given an instant, [`Aggregator::compute_stats`] derives two calendar
//! quantities and asks one upstream about each:
//!
//! - a [`TimeWindow`] over the UTC day, used to count commits on GitHub
//! - the calendar date in the developer's time zone, used to ask WakaTime for
//!   that day's coding time
//!
//! The result is all-or-nothing: a failure of either upstream fails the whole
//! computation. A missing WakaTime entry is not a failure and reads as
//! `"0 mins"`.

mod aggregator;
mod window;

pub use aggregator::{Aggregator, Credentials, Endpoints, NO_CODING_TIME};
pub use window::{DateGranularity, TimeWindow, local_date, resolve_time_zone};

use crate::upstream::UpstreamError;
use core::error::Error;
use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};

/// Today's numbers, as returned by `GET /api`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsResult {
    /// The window commits were counted over
    #[serde(rename = "date_github")]
    pub github_window: TimeWindow,

    /// The calendar day coding time was reported for
    #[serde(rename = "date_wakatime")]
    pub wakatime_date: jiff::civil::Date,

    pub username: String,
    pub total_commits: u64,
    pub time_coded: String,
}

/// Body of every JSON error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
}

impl ErrorResult {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Why stats could not be computed.
#[derive(Debug)]
pub enum StatsError {
    /// GitHub or WakaTime failed
    Upstream(UpstreamError),

    /// The current instant could not be placed on the configured calendar
    Clock(ohno::AppError),
}

impl StatsError {
    #[must_use]
    pub const fn as_upstream(&self) -> Option<&UpstreamError> {
        match self {
            Self::Upstream(e) => Some(e),
            Self::Clock(_) => None,
        }
    }
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream(e) => Display::fmt(e, f),
            Self::Clock(e) => Display::fmt(e, f),
        }
    }
}

impl Error for StatsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Upstream(e) => Some(e),
            Self::Clock(_) => None,
        }
    }
}

impl From<UpstreamError> for StatsError {
    fn from(e: UpstreamError) -> Self {
        Self::Upstream(e)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::upstream::Service;

    fn sample() -> StatsResult {
        let now = "2024-03-01T19:00:00Z".parse().unwrap();
        StatsResult {
            github_window: TimeWindow::for_instant(now, DateGranularity::ExactDate),
            wakatime_date: jiff::civil::date(2024, 3, 2),
            username: "octocat".into(),
            total_commits: 0,
            time_coded: NO_CODING_TIME.into(),
        }
    }

    #[test]
    fn test_stats_result_wire_format() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"date_github":"2024-03-01","date_wakatime":"2024-03-02","username":"octocat","total_commits":0,"time_coded":"0 mins"}"#
        );
    }

    #[test]
    fn test_error_result_wire_format() {
        let json = serde_json::to_string(&ErrorResult::new("Forbidden")).unwrap();
        assert_eq!(json, r#"{"error":"Forbidden"}"#);
    }

    #[test]
    fn test_stats_error_display_is_upstream_message() {
        let e = StatsError::from(UpstreamError::status(Service::WakaTime, 503));
        assert_eq!(e.to_string(), "WakaTime API error: 503");
        assert_eq!(e.as_upstream().and_then(UpstreamError::http_status), Some(503));
    }
}
