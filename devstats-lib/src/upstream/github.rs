//! GitHub commit search client.

use super::client;
use super::{Service, UpstreamError};
use crate::stats::TimeWindow;
use core::time::Duration;
use reqwest::header::ACCEPT;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Commit search still answers with the preview media type.
const COMMIT_SEARCH_MEDIA_TYPE: &str = "application/vnd.github.cloak-preview+json";

const LOG_TARGET: &str = "    github";

/// Only the aggregate is read; items are never paged through.
#[derive(Debug, Deserialize)]
pub struct CommitSearch {
    pub total_count: u64,
}

/// GitHub API client scoped to commit search
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client authenticating with a personal access token.
    pub fn new(token: &str, base_url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        Ok(Self {
            client: client::build(&format!("token {token}"), timeout)?,
            base_url: base_url.into(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Count the commits authored by `username` with a committer date inside `window`.
    ///
    /// The total reported by the search API is taken as-is.
    pub async fn count_commits(&self, username: &str, window: &TimeWindow) -> Result<u64, UpstreamError> {
        let query = search_query(username, window);
        log::debug!(target: LOG_TARGET, "searching commits: {query}");

        let request = self
            .client
            .get(client::endpoint(&self.base_url, "/search/commits"))
            .query(&[("q", query.as_str())])
            .header(ACCEPT, COMMIT_SEARCH_MEDIA_TYPE);

        let resp = client::send(Service::GitHub, request).await?;
        let search: CommitSearch = resp.json().await.map_err(|e| UpstreamError::decode(Service::GitHub, &e))?;

        log::debug!(target: LOG_TARGET, "{} commits for '{username}' in {window}", search.total_count);
        Ok(search.total_count)
    }
}

/// The search expression for one author over one window.
#[must_use]
pub fn search_query(username: &str, window: &TimeWindow) -> String {
    format!("author:{username} committer-date:{window}")
}
