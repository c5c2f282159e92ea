//! Microsecond-precision timestamps.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};

/// A point in time with microsecond precision.
///
/// This is the store's native timestamp resolution. Converting from a
/// [`chrono`] datetime truncates (never rounds) sub-microsecond nanoseconds,
/// and drops the time zone: reading back yields the same instant expressed
/// in UTC or the system-default zone, not the originally written zone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from microseconds since the Unix epoch.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Microseconds since the Unix epoch.
    pub const fn micros(self) -> i64 {
        self.0
    }

    /// The current time, truncated to microsecond precision.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_micros())
    }

    /// Convert a datetime in any zone, truncating sub-microsecond precision.
    pub fn from_datetime<Tz: chrono::TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Self(datetime.timestamp_micros())
    }

    /// Expand back to a UTC datetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the microsecond count is outside the range
    /// `chrono` can represent.
    pub fn to_utc(self) -> ValueResult<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.0).ok_or(ValueError::timestamp_out_of_range(self.0))
    }

    /// Expand back to a datetime in the system-default zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the microsecond count is outside the range
    /// `chrono` can represent.
    pub fn to_local(self) -> ValueResult<DateTime<Local>> {
        self.to_utc().map(|dt| dt.with_timezone(&Local))
    }
}

impl<Tz: chrono::TimeZone> From<&DateTime<Tz>> for Timestamp {
    fn from(datetime: &DateTime<Tz>) -> Self {
        Self::from_datetime(datetime)
    }
}
