//! Human-readable insights.

use std::collections::BTreeMap;

use chrono::{TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use super::SessionSummary;
use crate::storage::SessionRecord;

/// Completed focus sessions needed before any insight is offered.
pub const MIN_SESSIONS_FOR_INSIGHTS: usize = 3;
/// Focus records needed before hour-of-day patterns are looked for.
pub const MIN_SESSIONS_FOR_PATTERNS: usize = 5;
/// Minutes of the classic pomodoro, the yardstick for session length.
pub const STANDARD_SESSION_MINUTES: u64 = 25;

pub const NO_DATA_MESSAGE: &str = "No data available for the selected time period.";
pub const MORE_SESSIONS_MESSAGE: &str = "Complete more sessions to see personalized insights.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    FlowAnalysis {
        flow_percentage: u64,
        avg_extension_minutes: u64,
    },
    SessionDuration {
        avg_minutes: u64,
    },
    FocusBreakRatio {
        /// One decimal, or "N/A" without any break time.
        ratio: String,
    },
    ProductivityPatterns(HourPattern),
}

impl Insight {
    pub fn title(&self) -> &'static str {
        match self {
            Insight::FlowAnalysis { .. } => "Flow State Analysis",
            Insight::SessionDuration { .. } => "Session Duration",
            Insight::FocusBreakRatio { .. } => "Focus to Break Ratio",
            Insight::ProductivityPatterns(_) => "Productivity Patterns",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Insight::FlowAnalysis {
                flow_percentage,
                avg_extension_minutes,
            } => format!(
                "You spend approximately {flow_percentage}% of your focus time in flow state, \
                 extending your sessions by an average of {avg_extension_minutes} minutes."
            ),
            Insight::SessionDuration { avg_minutes } => {
                let comparison = if *avg_minutes > STANDARD_SESSION_MINUTES {
                    "longer"
                } else {
                    "shorter"
                };
                format!(
                    "Your average focus session lasts {avg_minutes} minutes \
                     ({comparison} than the standard {STANDARD_SESSION_MINUTES} min)."
                )
            }
            Insight::FocusBreakRatio { ratio } => {
                // "N/A" parses to nothing and lands on the balanced advice.
                let advice = match ratio.parse::<f64>() {
                    Ok(r) if r > 5.0 => "Consider taking more breaks for optimal productivity.",
                    Ok(r) if r < 3.0 => {
                        "You take frequent breaks, which is good for maintaining attention."
                    }
                    _ => "This is a balanced ratio of work to rest.",
                };
                format!("Your focus to break ratio is {ratio}:1. {advice}")
            }
            Insight::ProductivityPatterns(pattern) => pattern.message(),
        }
    }
}

/// Hours of the day (0-23, local) where focus concentrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourPattern {
    pub most_sessions_hour: u32,
    /// Absent when no session reached flow.
    pub most_flow_hour: Option<u32>,
}

impl HourPattern {
    pub fn message(&self) -> String {
        let mut message = format!(
            "You tend to be most productive around {}",
            format_hour(self.most_sessions_hour)
        );
        if let Some(hour) = self.most_flow_hour {
            message.push_str(&format!(
                " and enter flow states most often around {}",
                format_hour(hour)
            ));
        }
        message.push('.');
        message
    }
}

/// Insights for a window, given its summary and its focus records.
///
/// Returns nothing below [`MIN_SESSIONS_FOR_INSIGHTS`] completed sessions.
pub fn generate<Tz: TimeZone>(
    summary: &SessionSummary,
    focus: &[&SessionRecord],
    tz: &Tz,
) -> Vec<Insight> {
    if summary.completed_sessions < MIN_SESSIONS_FOR_INSIGHTS {
        return Vec::new();
    }
    let mut insights = Vec::new();

    if summary.flow_percentage > 0 {
        insights.push(Insight::FlowAnalysis {
            flow_percentage: summary.flow_percentage,
            avg_extension_minutes: (summary.total_flow_minutes as f64
                / summary.completed_sessions as f64)
                .round() as u64,
        });
    }

    insights.push(Insight::SessionDuration {
        avg_minutes: summary.avg_session_minutes,
    });

    let ratio = if summary.total_break_minutes > 0 {
        format!(
            "{:.1}",
            summary.total_focus_minutes as f64 / summary.total_break_minutes as f64
        )
    } else {
        "N/A".to_string()
    };
    insights.push(Insight::FocusBreakRatio { ratio });

    if let Some(pattern) = hour_patterns(focus, tz) {
        insights.push(Insight::ProductivityPatterns(pattern));
    }
    insights
}

/// Busiest start hour and the hour with the most flow time.
///
/// Needs [`MIN_SESSIONS_FOR_PATTERNS`] records, and a busiest hour holding
/// more than one of them. Ties go to the earliest hour.
pub fn hour_patterns<Tz: TimeZone>(focus: &[&SessionRecord], tz: &Tz) -> Option<HourPattern> {
    if focus.len() < MIN_SESSIONS_FOR_PATTERNS {
        return None;
    }

    // hour -> (sessions, flow seconds)
    let mut by_hour: BTreeMap<u32, (u32, u64)> = BTreeMap::new();
    for record in focus {
        let hour = record.start.with_timezone(tz).hour();
        let entry = by_hour.entry(hour).or_default();
        entry.0 += 1;
        entry.1 += record.flow_state_duration_secs;
    }

    let mut best = (0u32, 0u32);
    let mut best_flow = (0u32, 0u64);
    for (&hour, &(count, flow)) in &by_hour {
        if count > best.1 {
            best = (hour, count);
        }
        if flow > best_flow.1 {
            best_flow = (hour, flow);
        }
    }

    (best.1 > 1).then(|| HourPattern {
        most_sessions_hour: best.0,
        most_flow_hour: (best_flow.1 > 0).then_some(best_flow.0),
    })
}

/// `"Xh Ym"`, or `"Ym"` under an hour.
pub fn format_time(minutes: u64) -> String {
    let (hours, mins) = (minutes / 60, minutes % 60);
    if hours == 0 {
        format!("{mins}m")
    } else {
        format!("{hours}h {mins}m")
    }
}

/// 12-hour clock label for an hour of the day.
pub fn format_hour(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        12 => "12 PM".to_string(),
        h if h > 12 => format!("{} PM", h - 12),
        h => format!("{h} AM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SessionKind;
    use chrono::{DateTime, Duration, Utc};

    fn focus_at(hour: u32, actual: u64) -> SessionRecord {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 5, 6, hour, 10, 0).unwrap();
        SessionRecord::begin(SessionKind::Focus, 1500, start)
            .finalize(start + Duration::seconds(actual as i64), actual)
    }

    fn summary(completed: usize, focus: u64, flow: u64, brk: u64) -> SessionSummary {
        SessionSummary {
            total_focus_minutes: focus,
            total_flow_minutes: flow,
            total_break_minutes: brk,
            avg_session_minutes: 25,
            flow_percentage: if focus > 0 { flow * 100 / focus } else { 0 },
            completed_sessions: completed,
        }
    }

    #[test]
    fn time_and_hour_formatting() {
        assert_eq!(format_time(0), "0m");
        assert_eq!(format_time(59), "59m");
        assert_eq!(format_time(125), "2h 5m");
        assert_eq!(format_hour(0), "12 AM");
        assert_eq!(format_hour(9), "9 AM");
        assert_eq!(format_hour(12), "12 PM");
        assert_eq!(format_hour(15), "3 PM");
    }

    #[test]
    fn no_insights_below_three_sessions() {
        assert!(generate(&summary(2, 50, 0, 10), &[], &Utc).is_empty());
    }

    #[test]
    fn ratio_and_advice() {
        let insights = generate(&summary(3, 75, 0, 10), &[], &Utc);
        assert_eq!(insights.len(), 2);
        assert_eq!(
            insights[1],
            Insight::FocusBreakRatio {
                ratio: "7.5".into()
            }
        );
        assert!(insights[1].message().contains("Consider taking more breaks"));

        let balanced = generate(&summary(3, 75, 0, 0), &[], &Utc);
        assert!(balanced[1].message().starts_with("Your focus to break ratio is N/A:1."));
        assert!(balanced[1].message().ends_with("balanced ratio of work to rest."));

        let frequent = generate(&summary(3, 75, 0, 30), &[], &Utc);
        assert!(frequent[1].message().contains("frequent breaks"));
    }

    #[test]
    fn flow_analysis_when_flow_present() {
        let insights = generate(&summary(3, 90, 9, 15), &[], &Utc);
        assert_eq!(
            insights[0],
            Insight::FlowAnalysis {
                flow_percentage: 10,
                avg_extension_minutes: 3
            }
        );
    }

    #[test]
    fn patterns_need_five_records_and_a_repeat() {
        let records: Vec<SessionRecord> = [9, 10, 11, 14].iter().map(|&h| focus_at(h, 1500)).collect();
        let refs: Vec<&SessionRecord> = records.iter().collect();
        assert_eq!(hour_patterns(&refs, &Utc), None);

        let records: Vec<SessionRecord> =
            [9, 10, 11, 14, 15].iter().map(|&h| focus_at(h, 1500)).collect();
        let refs: Vec<&SessionRecord> = records.iter().collect();
        assert_eq!(hour_patterns(&refs, &Utc), None);
    }

    #[test]
    fn patterns_pick_earliest_busiest_hour() {
        let records = vec![
            focus_at(14, 1500),
            focus_at(14, 1500),
            focus_at(9, 1600),
            focus_at(9, 1500),
            focus_at(16, 1900),
        ];
        let refs: Vec<&SessionRecord> = records.iter().collect();
        let pattern = hour_patterns(&refs, &Utc).unwrap();
        assert_eq!(pattern.most_sessions_hour, 9);
        assert_eq!(pattern.most_flow_hour, Some(16));
        assert_eq!(
            pattern.message(),
            "You tend to be most productive around 9 AM and enter flow states most often around 4 PM."
        );
    }

    #[test]
    fn patterns_without_flow_omit_flow_hour() {
        let records: Vec<SessionRecord> = (0..5).map(|_| focus_at(13, 1500)).collect();
        let refs: Vec<&SessionRecord> = records.iter().collect();
        let pattern = hour_patterns(&refs, &Utc).unwrap();
        assert_eq!(pattern.most_flow_hour, None);
        assert_eq!(pattern.message(), "You tend to be most productive around 1 PM.");
    }
}
