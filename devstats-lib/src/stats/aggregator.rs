use super::window::{DateGranularity, TimeWindow, local_date, resolve_time_zone};
use super::{StatsError, StatsResult};
use crate::Result;
use crate::config::Config;
use crate::upstream::{GitHubClient, WakaTimeClient, github, wakatime};
use chrono::{DateTime, Utc};
use core::fmt;
use jiff::tz::TimeZone;

const LOG_TARGET: &str = "     stats";

/// Reported when WakaTime has no entry for the day.
pub const NO_CODING_TIME: &str = "0 mins";

/// Secrets supplied by the hosting environment.
#[derive(Clone)]
pub struct Credentials {
    pub github_token: String,
    pub github_username: String,
    pub wakatime_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("github_username", &self.github_username)
            .field("wakatime_api_key", &"<redacted>")
            .finish()
    }
}

/// Where the upstream APIs live
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub github_api_url: String,
    pub wakatime_api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api_url: github::DEFAULT_API_URL.to_string(),
            wakatime_api_url: wakatime::DEFAULT_API_URL.to_string(),
        }
    }
}

/// Computes today's stats for one developer.
///
/// Stateless between calls: every invocation derives its dates from the
/// instant it is given and performs exactly one call to each upstream.
#[derive(Debug, Clone)]
pub struct Aggregator {
    github: GitHubClient,
    wakatime: WakaTimeClient,
    username: String,
    granularity: DateGranularity,
    time_zone: TimeZone,
}

impl Aggregator {
    pub fn new(credentials: &Credentials, endpoints: &Endpoints, config: &Config) -> Result<Self> {
        Ok(Self {
            github: GitHubClient::new(&credentials.github_token, endpoints.github_api_url.as_str(), config.upstream_timeout)?,
            wakatime: WakaTimeClient::new(&credentials.wakatime_api_key, endpoints.wakatime_api_url.as_str(), config.upstream_timeout)?,
            username: credentials.github_username.clone(),
            granularity: config.date_granularity,
            time_zone: resolve_time_zone(&config.wakatime_time_zone)?,
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Compute the stats for the day containing `now`.
    ///
    /// Both upstream calls are dispatched together; the first failure wins and
    /// the other call is dropped.
    pub async fn compute_stats(&self, now: DateTime<Utc>) -> Result<StatsResult, StatsError> {
        let github_window = TimeWindow::for_instant(now, self.granularity);
        let wakatime_date = local_date(now, &self.time_zone).map_err(StatsError::Clock)?;

        log::debug!(
            target: LOG_TARGET,
            "computing stats for '{}': github window {github_window}, wakatime date {wakatime_date}",
            self.username
        );

        let (total_commits, summaries) = tokio::try_join!(
            self.github.count_commits(&self.username, &github_window),
            self.wakatime.summary(wakatime_date),
        )?;

        let time_coded = summaries.first_day_text().unwrap_or(NO_CODING_TIME).to_string();

        Ok(StatsResult {
            github_window,
            wakatime_date,
            username: self.username.clone(),
            total_commits,
            time_coded,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            github_token: "ghp_secret".into(),
            github_username: "octocat".into(),
            wakatime_api_key: "waka_secret".into(),
        }
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let text = format!("{:?}", credentials());
        assert!(!text.contains("ghp_secret"));
        assert!(!text.contains("waka_secret"));
        assert!(text.contains("octocat"));
    }

    #[test]
    fn test_aggregator_debug_redacts_secrets() {
        let aggregator = Aggregator::new(&credentials(), &Endpoints::default(), &Config::default()).unwrap();
        let text = format!("{aggregator:?}");
        assert!(!text.contains("ghp_secret"));
        assert!(!text.contains("waka_secret"));
        assert_eq!(aggregator.username(), "octocat");
    }

    #[test]
    fn test_aggregator_rejects_unknown_time_zone() {
        let config = Config { wakatime_time_zone: "Atlantis/Center".into(), ..Config::default() };
        assert!(Aggregator::new(&credentials(), &Endpoints::default(), &config).is_err());
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.github_api_url, "https://api.github.com");
        assert_eq!(endpoints.wakatime_api_url, "https://wakatime.com");
    }
}
