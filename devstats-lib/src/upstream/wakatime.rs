//! WakaTime summaries client.

use super::client;
use super::{Service, UpstreamError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use core::time::Duration;
use jiff::civil::Date;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://wakatime.com";

const LOG_TARGET: &str = "  wakatime";

/// Response of `GET /api/v1/users/current/summaries`
#[derive(Debug, Default, Deserialize)]
pub struct Summaries {
    #[serde(default)]
    pub data: Option<Vec<DaySummary>>,
}

/// One day of the summaries range
#[derive(Debug, Deserialize)]
pub struct DaySummary {
    #[serde(default)]
    pub grand_total: Option<GrandTotal>,
}

#[derive(Debug, Deserialize)]
pub struct GrandTotal {
    /// Human readable duration such as `3 hrs 12 mins`
    #[serde(default)]
    pub text: Option<String>,
}

impl Summaries {
    /// The human readable total of the first day, if WakaTime reported one.
    #[must_use]
    pub fn first_day_text(&self) -> Option<&str> {
        self.data
            .as_deref()?
            .first()?
            .grand_total
            .as_ref()?
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}

/// WakaTime API client scoped to the current user's summaries
#[derive(Debug, Clone)]
pub struct WakaTimeClient {
    client: reqwest::Client,
    base_url: String,
}

impl WakaTimeClient {
    /// Create a client authenticating with HTTP Basic, API key as user and an empty password.
    pub fn new(api_key: &str, base_url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        Ok(Self {
            client: client::build(&basic_authorization(api_key), timeout)?,
            base_url: base_url.into(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the summary of a single calendar day.
    pub async fn summary(&self, date: Date) -> Result<Summaries, UpstreamError> {
        let day = date.to_string();
        log::debug!(target: LOG_TARGET, "fetching summary for {day}");

        let request = self
            .client
            .get(client::endpoint(&self.base_url, "/api/v1/users/current/summaries"))
            .query(&[("start", day.as_str()), ("end", day.as_str())]);

        let resp = client::send(Service::WakaTime, request).await?;
        resp.json().await.map_err(|e| UpstreamError::decode(Service::WakaTime, &e))
    }
}

fn basic_authorization(api_key: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{api_key}:")))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_basic_authorization_has_empty_password() {
        assert_eq!(basic_authorization("key"), "Basic a2V5Og==");
    }

    #[test]
    fn test_first_day_text() {
        let json = r#"{
            "data": [
                { "grand_total": { "text": "3 hrs 12 mins", "total_seconds": 11520.0 } }
            ],
            "cumulative_total": { "text": "3 hrs 12 mins" }
        }"#;

        let summaries: Summaries = serde_json::from_str(json).unwrap();
        assert_eq!(summaries.first_day_text(), Some("3 hrs 12 mins"));
    }

    #[test]
    fn test_first_day_text_empty_data() {
        let summaries: Summaries = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(summaries.first_day_text(), None);
    }

    #[test]
    fn test_first_day_text_null_data() {
        let summaries: Summaries = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert_eq!(summaries.first_day_text(), None);
    }

    #[test]
    fn test_first_day_text_missing_fields() {
        let summaries: Summaries = serde_json::from_str(r#"{"data": [{}]}"#).unwrap();
        assert_eq!(summaries.first_day_text(), None);

        let summaries: Summaries = serde_json::from_str(r#"{"data": [{"grand_total": {}}]}"#).unwrap();
        assert_eq!(summaries.first_day_text(), None);
    }

    #[test]
    fn test_first_day_text_empty_string() {
        let summaries: Summaries = serde_json::from_str(r#"{"data": [{"grand_total": {"text": ""}}]}"#).unwrap();
        assert_eq!(summaries.first_day_text(), None);
    }

    #[test]
    fn test_missing_data_key() {
        let summaries: Summaries = serde_json::from_str("{}").unwrap();
        assert_eq!(summaries.first_day_text(), None);
    }
}
