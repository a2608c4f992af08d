//! Timestamp formatting
//!
//! Stored timestamps are epoch milliseconds. Formatting never fails: missing or
//! out-of-range values render as [`UNKNOWN_TIME`].

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Display format for timestamps
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for a missing or unusable timestamp
pub const UNKNOWN_TIME: &str = "unknown time";

/// Resolve the host's IANA time zone, falling back to UTC
#[must_use]
pub fn system_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

/// Formats epoch-millisecond timestamps in a fixed time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormatter {
    timezone: Tz,
}

impl Default for TimeFormatter {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeFormatter {
    /// Create a formatter for the given time zone
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Formatter pinned to UTC
    #[must_use]
    pub const fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Time zone used for display
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Format an optional epoch-millisecond timestamp
    #[must_use]
    pub fn format(&self, millis: Option<i64>) -> String {
        millis
            .and_then(DateTime::from_timestamp_millis)
            .map_or_else(
                || UNKNOWN_TIME.to_string(),
                |utc| {
                    utc.with_timezone(&self.timezone)
                        .format(DATETIME_FORMAT)
                        .to_string()
                },
            )
    }

    /// Epoch milliseconds of local midnight at the start of `date`
    #[must_use]
    pub fn start_of_day(&self, date: NaiveDate) -> Option<i64> {
        self.local_millis(date, NaiveTime::MIN)
    }

    /// Epoch milliseconds of 23:59:59 local time on `date`
    #[must_use]
    pub fn end_of_day(&self, date: NaiveDate) -> Option<i64> {
        self.local_millis(date, NaiveTime::from_hms_opt(23, 59, 59)?)
    }

    fn local_millis(&self, date: NaiveDate, time: NaiveTime) -> Option<i64> {
        self.timezone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.timestamp_millis())
    }
}
