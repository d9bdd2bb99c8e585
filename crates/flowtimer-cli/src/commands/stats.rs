use chrono::Local;
use clap::{Args, ValueEnum};
use flowtimer_core::stats::{format_time, AnalyticsReport, Timeframe};
use flowtimer_core::{Config, SessionStore};

#[derive(Clone, Copy, ValueEnum)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl From<Period> for Timeframe {
    fn from(period: Period) -> Self {
        match period {
            Period::Day => Timeframe::Day,
            Period::Week => Timeframe::Week,
            Period::Month => Timeframe::Month,
        }
    }
}

#[derive(Args)]
pub struct StatsArgs {
    /// Window to report on
    #[arg(value_enum, default_value = "day")]
    period: Period,
    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatsArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_database(config)?;
    let sessions = SessionStore::load(&db);
    let report = AnalyticsReport::build(sessions.all(), args.period.into(), &Local::now());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &AnalyticsReport) {
    let summary = &report.summary;
    println!("Stats for this {}", report.timeframe.as_str());
    println!("  Total focus time:  {}", format_time(summary.total_focus_minutes));
    println!("  Avg session:       {}m", summary.avg_session_minutes);
    println!("  Flow state:        {}%", summary.flow_percentage);
    println!("  Sessions:          {}", summary.completed_sessions);

    if !report.chart.is_empty() {
        println!();
        println!("Recent focus sessions (planned / focus / flow, minutes)");
        for point in &report.chart {
            println!(
                "  {:<12} {:>4} / {:>4} / {:>4}",
                point.label, point.planned_minutes, point.base_focus_minutes, point.flow_minutes
            );
        }
        let b = &report.breakdown;
        println!();
        println!(
            "Breakdown: focus {}m, flow {}m, break {}m",
            b.focus_minutes, b.flow_minutes, b.break_minutes
        );
    }

    println!();
    if let Some(notice) = &report.notice {
        println!("{notice}");
    }
    for insight in &report.insights {
        println!("{}", insight.title());
        println!("  {}", insight.message());
    }
}
