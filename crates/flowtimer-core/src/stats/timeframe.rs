//! Analytics windows in local time.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The period an analytics report covers, always ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Since local midnight today.
    #[default]
    Day,
    /// Since local midnight on the most recent Sunday.
    Week,
    /// Since local midnight on the first of the month.
    Month,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        }
    }

    /// First instant inside the window, evaluated in `now`'s time zone.
    pub fn window_start<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Utc> {
        let today = now.date_naive();
        let first_day = match self {
            Timeframe::Day => today,
            Timeframe::Week => {
                today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
            }
            Timeframe::Month => today.with_day(1).unwrap_or(today),
        };
        local_midnight(&now.timezone(), first_day)
    }
}

/// Midnight at the start of `day` in `tz`, or the first valid instant after
/// it when a DST change skips midnight.
fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc()),
    }
}
