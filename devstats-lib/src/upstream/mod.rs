//! Clients for the two upstream capabilities devstats aggregates.
//!
//! - [`GitHubClient`]: commit search, used for the number of commits in a window
//! - [`WakaTimeClient`]: per-day coding summaries
//!
//! Both clients carry their credentials as sensitive default headers, apply a
//! fixed per-request timeout, and never retry. Any non-2xx answer becomes an
//! [`UpstreamError`] carrying the status code.

mod client;
mod error;
pub mod github;
pub mod wakatime;

pub use error::{Service, UpstreamError, UpstreamErrorKind};
pub use github::GitHubClient;
pub use wakatime::WakaTimeClient;
