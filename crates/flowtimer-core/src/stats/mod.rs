//! Analytics over the session log.
//!
//! Everything here is a pure function of the log and a window: records
//! that started at or after the window start are summarized, charted and
//! turned into insights. Nothing reads the clock except through the `now`
//! handed to [`AnalyticsReport::build`].

mod insights;
mod summary;
mod timeframe;

pub use insights::{
    format_hour, format_time, generate as generate_insights, hour_patterns, HourPattern, Insight,
    MORE_SESSIONS_MESSAGE, NO_DATA_MESSAGE,
};
pub use summary::{
    chart_series, round_minutes, summarize, Breakdown, ChartPoint, SessionSummary, CHART_SESSIONS,
};
pub use timeframe::Timeframe;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::storage::SessionRecord;

/// Everything the analytics view shows for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub timeframe: Timeframe,
    pub window_start: DateTime<Utc>,
    /// False when no record of any kind falls in the window.
    pub has_data: bool,
    pub summary: SessionSummary,
    pub chart: Vec<ChartPoint>,
    pub breakdown: Breakdown,
    pub insights: Vec<Insight>,
    /// Shown instead of insights when there are none.
    pub notice: Option<String>,
}

impl AnalyticsReport {
    /// Build the report for `timeframe` ending at `now`. Windows, chart
    /// labels and hour patterns use `now`'s time zone.
    pub fn build<Tz>(log: &[SessionRecord], timeframe: Timeframe, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let tz = now.timezone();
        let window_start = timeframe.window_start(now);
        let in_window: Vec<&SessionRecord> =
            log.iter().filter(|r| r.start >= window_start).collect();

        if in_window.is_empty() {
            return Self::empty(timeframe, window_start);
        }

        let summary = summarize(log, window_start);
        let focus: Vec<&SessionRecord> =
            in_window.iter().copied().filter(|r| r.is_focus()).collect();
        let insights = generate_insights(&summary, &focus, &tz);
        let notice = insights
            .is_empty()
            .then(|| MORE_SESSIONS_MESSAGE.to_string());

        Self {
            timeframe,
            window_start,
            has_data: true,
            chart: chart_series(in_window.iter().copied(), timeframe, &tz),
            breakdown: Breakdown::from(&summary),
            summary,
            insights,
            notice,
        }
    }

    fn empty(timeframe: Timeframe, window_start: DateTime<Utc>) -> Self {
        Self {
            timeframe,
            window_start,
            has_data: false,
            summary: SessionSummary::default(),
            chart: Vec::new(),
            breakdown: Breakdown::default(),
            insights: Vec::new(),
            notice: Some(NO_DATA_MESSAGE.to_string()),
        }
    }
}
