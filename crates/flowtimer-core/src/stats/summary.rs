//! Summary scalars, chart series and breakdown over the session log.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::Timeframe;
use crate::storage::{SessionKind, SessionRecord};

/// Focus records shown in the duration chart.
pub const CHART_SESSIONS: usize = 10;

/// Seconds to whole minutes, halves rounding up.
pub fn round_minutes(secs: u64) -> u64 {
    (secs + 30) / 60
}

/// Aggregate figures for one analytics window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_focus_minutes: u64,
    pub total_flow_minutes: u64,
    pub total_break_minutes: u64,
    /// Focus time excluding flow, per completed focus session.
    pub avg_session_minutes: u64,
    /// Share of focus time spent in flow, 0..=100.
    pub flow_percentage: u64,
    pub completed_sessions: usize,
}

/// Summarize every record that started at or after `window_start`.
///
/// All ratios fall back to 0 when their denominator is empty.
pub fn summarize(log: &[SessionRecord], window_start: DateTime<Utc>) -> SessionSummary {
    let mut focus_secs = 0u64;
    let mut flow_secs = 0u64;
    let mut break_secs = 0u64;
    let mut focus_count = 0usize;

    for record in log.iter().filter(|r| r.start >= window_start) {
        match record.kind {
            SessionKind::Focus => {
                focus_count += 1;
                focus_secs += record.actual_duration_secs;
                flow_secs += record.flow_state_duration_secs;
            }
            SessionKind::Break => break_secs += record.actual_duration_secs,
        }
    }

    let avg_session_minutes = if focus_count > 0 {
        (focus_secs.saturating_sub(flow_secs) as f64 / focus_count as f64 / 60.0).round() as u64
    } else {
        0
    };
    let flow_percentage = if focus_secs > 0 {
        (flow_secs as f64 / focus_secs as f64 * 100.0).round() as u64
    } else {
        0
    };

    SessionSummary {
        total_focus_minutes: round_minutes(focus_secs),
        total_flow_minutes: round_minutes(flow_secs),
        total_break_minutes: round_minutes(break_secs),
        avg_session_minutes,
        flow_percentage,
        completed_sessions: focus_count,
    }
}

/// One bar group in the session duration chart, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub planned_minutes: u64,
    /// Focus time up to the planned duration.
    pub base_focus_minutes: u64,
    pub flow_minutes: u64,
}

/// The most recent [`CHART_SESSIONS`] focus records, oldest first.
pub fn chart_series<'a, I, Tz>(records: I, timeframe: Timeframe, tz: &Tz) -> Vec<ChartPoint>
where
    I: IntoIterator<Item = &'a SessionRecord>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut focus: Vec<&SessionRecord> = records.into_iter().filter(|r| r.is_focus()).collect();
    focus.sort_by_key(|r| r.start);
    let skip = focus.len().saturating_sub(CHART_SESSIONS);

    focus
        .into_iter()
        .skip(skip)
        .map(|record| {
            let planned = round_minutes(record.planned_duration_secs);
            ChartPoint {
                label: session_label(record.start, timeframe, tz),
                planned_minutes: planned,
                base_focus_minutes: round_minutes(record.actual_duration_secs).min(planned),
                flow_minutes: round_minutes(record.flow_state_duration_secs),
            }
        })
        .collect()
}

fn session_label<Tz>(start: DateTime<Utc>, timeframe: Timeframe, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = start.with_timezone(tz);
    let pattern = match timeframe {
        Timeframe::Day => "%H:%M",
        Timeframe::Week => "%a %H:%M",
        Timeframe::Month => "%b %-d",
    };
    local.format(pattern).to_string()
}

/// Minutes split into plain focus, flow and break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub focus_minutes: u64,
    pub flow_minutes: u64,
    pub break_minutes: u64,
}

impl From<&SessionSummary> for Breakdown {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            focus_minutes: summary
                .total_focus_minutes
                .saturating_sub(summary.total_flow_minutes),
            flow_minutes: summary.total_flow_minutes,
            break_minutes: summary.total_break_minutes,
        }
    }
}
