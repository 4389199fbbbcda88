//! Display-granularity time bucketing
//!
//! Persisted records carry their creation time pre-bucketed to every
//! display granularity so downstream aggregations never recompute period
//! boundaries.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamp expanded to the start of each display period.
///
/// All fields are unix milliseconds. `ms` is the raw instant; the rest
/// are the starts of the hour, day, week (Monday), month, quarter, and
/// year containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub ms: i64,
    pub hour: i64,
    pub day: i64,
    pub week: i64,
    pub month: i64,
    pub quarter: i64,
    pub year: i64,
}

impl TimeBucket {
    /// Bucket an instant to all display granularities.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let ms = dt.timestamp_millis();
        let hour = ms - ms.rem_euclid(3_600_000);

        let date = dt.date_naive();
        let week_start = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
        let month_start = date.with_day(1).unwrap_or(date);
        let quarter_month = date.month() - (date.month() - 1) % 3;
        let quarter_start =
            NaiveDate::from_ymd_opt(date.year(), quarter_month, 1).unwrap_or(month_start);
        let year_start = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(quarter_start);

        Self {
            ms,
            hour,
            day: start_of_day_ms(date),
            week: start_of_day_ms(week_start),
            month: start_of_day_ms(month_start),
            quarter: start_of_day_ms(quarter_start),
            year: start_of_day_ms(year_start),
        }
    }

    /// Bucket a unix-seconds timestamp (the CLI reports seconds).
    pub fn from_unix_seconds(secs: i64) -> Self {
        Self::from_datetime(
            DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_else(Utc::now),
        )
    }

    /// Bucket a unix-milliseconds timestamp (persisted records carry ms).
    pub fn from_unix_millis(ms: i64) -> Self {
        Self::from_datetime(
            DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_else(Utc::now),
        )
    }

    /// Bucket the current instant.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }
}

fn start_of_day_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}
