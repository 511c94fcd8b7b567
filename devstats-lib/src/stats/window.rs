//! Calendar computations for the daily stats.
//!
//! GitHub is queried by UTC calendar day while WakaTime is queried by the
//! calendar day of the developer's own time zone. The two can differ: at
//! `2024-03-01T19:00:00Z` the UTC date is still March 1st, but in Kolkata
//! (UTC+05:30) it is already March 2nd.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Utc};
use core::fmt::{self, Display, Formatter};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize, Serializer};

/// How the GitHub `committer-date:` qualifier is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateGranularity {
    /// A single calendar date, e.g. `committer-date:2024-03-01`
    #[default]
    ExactDate,

    /// An explicit millisecond range covering the whole UTC day
    UtcDayWindow,
}

/// The span of time commits are counted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// One UTC calendar date, matched by GitHub at date granularity.
    Date(NaiveDate),

    /// `[start, end]` in UTC, both ends inclusive at millisecond precision.
    Range { start: DateTime<Utc>, end: DateTime<Utc> },
}

impl TimeWindow {
    /// The window covering the UTC day that contains `now`.
    #[must_use]
    pub fn for_instant(now: DateTime<Utc>, granularity: DateGranularity) -> Self {
        let date = now.date_naive();
        match granularity {
            DateGranularity::ExactDate => Self::Date(date),
            DateGranularity::UtcDayWindow => {
                let start = date.and_time(NaiveTime::MIN).and_utc();
                let end = start + TimeDelta::days(1) - TimeDelta::milliseconds(1);
                Self::Range { start, end }
            }
        }
    }

    /// Whether a commit made at `instant` falls inside this window.
    #[cfg(test)]
    fn contains(&self, instant: DateTime<Utc>) -> bool {
        match self {
            Self::Date(date) => instant.date_naive() == *date,
            Self::Range { start, end } => (*start..=*end).contains(&instant),
        }
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Range { start, end } => write!(
                f,
                "{}..{}",
                start.to_rfc3339_opts(SecondsFormat::Millis, true),
                end.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
        }
    }
}

impl Serialize for TimeWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Resolve an IANA time zone name such as `Asia/Kolkata`.
pub fn resolve_time_zone(name: &str) -> crate::Result<TimeZone> {
    TimeZone::get(name).into_app_err_with(|| format!("unknown time zone '{name}'"))
}

/// The calendar date of `now` as observed in `tz`.
///
/// This goes through the zone's offset rules, so it stays correct across
/// midnight in either zone and across DST transitions for zones that have them.
pub fn local_date(now: DateTime<Utc>, tz: &TimeZone) -> crate::Result<Date> {
    let timestamp = jiff::Timestamp::from_second(now.timestamp())
        .into_app_err_with(|| format!("instant {now} is outside the supported calendar range"))?;
    Ok(timestamp.to_zoned(tz.clone()).date())
}
