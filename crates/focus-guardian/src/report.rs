//! Console output

use chrono::NaiveDateTime;
use guardian_core::format;
use guardian_notify::AlertRecord;

use crate::analysis::SessionAnalysis;
use crate::session::{Session, TIME_FORMAT};

// ANSI color codes
pub const RED: &str = "\x1b[0;31m";
pub const GREEN: &str = "\x1b[0;32m";
pub const YELLOW: &str = "\x1b[0;33m";
pub const CYAN: &str = "\x1b[0;36m";
pub const MAGENTA: &str = "\x1b[0;35m";
pub const BOLD: &str = "\x1b[1m";
const NC: &str = "\x1b[0m";

/// Check if stdout is a TTY and colors should be used
pub fn use_colors() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

/// Conditionally apply color
pub fn color(code: &str, text: &str) -> String {
    paint(use_colors(), code, text)
}

fn paint(enabled: bool, code: &str, text: &str) -> String {
    if enabled {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

fn heading(text: &str) -> String {
    color(&format!("{}{}", BOLD, MAGENTA), text)
}

pub fn print_session_started(goal: &str, strict: bool, interval_secs: u64) {
    println!("{} Focus session started", color(GREEN, "[ok]"));
    println!();
    println!("{}", heading("FOCUS GUARDIAN"));
    println!();
    println!("  {}      {}", color(CYAN, "Goal:"), goal);
    println!(
        "  {}      {}",
        color(CYAN, "Mode:"),
        if strict { "strict (blocks after repeated distractions)" } else { "standard" }
    );
    println!("  {}  every {}s", color(CYAN, "Polling:"), interval_secs);
    println!();
    println!("Press Ctrl-C to end the session");
}

pub fn print_session_ended(session: &Session, last_poll: Option<NaiveDateTime>) {
    println!();
    println!("{} Focus session ended", color(GREEN, "[ok]"));
    println!(
        "Focused for {} with {} distraction{}",
        format::duration(session.total_time),
        session.distractions.len(),
        if session.distractions.len() == 1 { "" } else { "s" }
    );
    match last_poll {
        Some(at) => println!("Last screen check at {}", at.format("%H:%M:%S")),
        None => println!("{}", color(YELLOW, "No screen checks completed")),
    }
}

pub fn print_analysis(analysis: &SessionAnalysis) {
    let summary = &analysis.session_summary;
    let time = &analysis.time_distribution;

    println!();
    println!("{}", heading("FOCUS SESSION ANALYSIS"));
    println!();
    if !summary.goal.is_empty() {
        println!("  {}          {}", color(CYAN, "Goal:"), summary.goal);
    }
    if let (Some(start), Some(end)) = (summary.start_time, summary.end_time) {
        println!(
            "  {}        {} - {}",
            color(CYAN, "Period:"),
            start.format(TIME_FORMAT),
            end.format(TIME_FORMAT)
        );
    }
    println!(
        "  {}      {}",
        color(CYAN, "Duration:"),
        format::duration(summary.duration_minutes * 60.0)
    );
    println!(
        "  {}  {}",
        color(CYAN, "Productivity:"),
        rate_color(summary.productivity_rate)
    );
    println!("  {}  {}", color(CYAN, "Distractions:"), summary.distraction_count);
    if summary.blocks_triggered > 0 {
        println!("  {}        {}", color(CYAN, "Blocks:"), summary.blocks_triggered);
    }
    if summary.session_count > 1 {
        println!("  {}      {}", color(CYAN, "Sessions:"), summary.session_count);
    }

    println!();
    println!("{}", color(BOLD, "Time Distribution"));
    println!("  Productive:  {:.1} min", time.productive_minutes);
    println!("  Distracted:  {:.1} min", time.distracted_minutes);

    if !analysis.top_activities.is_empty() {
        println!();
        println!("{}", color(BOLD, "Top Activities"));
        for activity in &analysis.top_activities {
            println!(
                "  {:<28} {:>6.1} min  ({:.1}%)",
                activity.name, activity.duration_minutes, activity.percentage
            );
        }
    }

    let patterns = &analysis.distraction_patterns;
    if let Some(peak) = patterns.peak_time {
        println!();
        println!("{}", color(BOLD, "Distraction Patterns"));
        println!(
            "  Morning: {}  Afternoon: {}  Evening: {}",
            patterns.morning_count, patterns.afternoon_count, patterns.evening_count
        );
        println!("  Peak: {}", color(YELLOW, peak.as_str()));
    }

    let earned = analysis.achievements.earned();
    if !earned.is_empty() {
        println!();
        println!("{}", color(BOLD, "Achievements"));
        for name in earned {
            println!("  {} {}", color(GREEN, "*"), name);
        }
    }
    if analysis.longest_streak_minutes > 0.0 {
        println!();
        println!(
            "Longest focus streak: {}",
            format::duration(analysis.longest_streak_minutes * 60.0)
        );
    }
}

pub fn print_recent_alerts(records: &[AlertRecord]) {
    if records.is_empty() {
        return;
    }
    println!();
    println!("{}", color(BOLD, "Recent Alerts"));
    for record in records {
        println!("  {}", record.format());
    }
}

fn rate_color(rate: f64) -> String {
    let code = if rate >= 80.0 {
        GREEN
    } else if rate >= 50.0 {
        YELLOW
    } else {
        RED
    };
    color(code, &format!("{:.1}%", rate))
}
