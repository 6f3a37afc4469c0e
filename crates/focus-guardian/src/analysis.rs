//! Session analysis
//!
//! Aggregates session history into the post-session report:
//! - Productive vs. distracted time
//! - Top activities by attributed time
//! - Time-of-day distraction histogram
//! - Achievements, recomputed from scratch on every call

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use guardian_core::format::round1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::{timestamp, Session};

/// Maximum number of entries in `top_activities`
pub const TOP_ACTIVITY_LIMIT: usize = 5;

const ONE_HOUR: f64 = 3600.0;
const HALF_HOUR: f64 = 1800.0;
const MARATHON: f64 = 5.0 * 3600.0;

/// Coarse time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Peak tie-break order: earlier entries win
    pub const PRIORITY: [TimeOfDay; 3] = [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening];

    /// Morning is [5, 12), afternoon [12, 18), evening everything else
    pub fn of_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Goal of the most recent session
    pub goal: String,
    #[serde(with = "timestamp::option", default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option", default)]
    pub end_time: Option<NaiveDateTime>,
    pub duration_minutes: f64,
    pub productivity_rate: f64,
    pub distraction_count: usize,
    pub blocks_triggered: u32,
    #[serde(default)]
    pub session_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDistribution {
    pub productive_minutes: f64,
    pub distracted_minutes: f64,
    pub productivity_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityShare {
    pub name: String,
    pub duration_minutes: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistractionPatterns {
    pub morning_count: u32,
    pub afternoon_count: u32,
    pub evening_count: u32,
    /// Unset when there were no distractions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_time: Option<TimeOfDay>,
}

impl DistractionPatterns {
    /// Bucket distraction timestamps by time of day
    pub fn from_times<'a>(times: impl IntoIterator<Item = &'a NaiveDateTime>) -> Self {
        let mut patterns = Self::default();
        for time in times {
            match TimeOfDay::of_hour(time.hour()) {
                TimeOfDay::Morning => patterns.morning_count += 1,
                TimeOfDay::Afternoon => patterns.afternoon_count += 1,
                TimeOfDay::Evening => patterns.evening_count += 1,
            }
        }
        patterns.peak_time = patterns.peak();
        patterns
    }

    pub fn count(&self, bucket: TimeOfDay) -> u32 {
        match bucket {
            TimeOfDay::Morning => self.morning_count,
            TimeOfDay::Afternoon => self.afternoon_count,
            TimeOfDay::Evening => self.evening_count,
        }
    }

    /// Bucket with the most distractions; ties resolve in `TimeOfDay::PRIORITY` order
    fn peak(&self) -> Option<TimeOfDay> {
        let mut best: Option<TimeOfDay> = None;
        for bucket in TimeOfDay::PRIORITY {
            let count = self.count(bucket);
            if count == 0 {
                continue;
            }
            match best {
                Some(b) if self.count(b) >= count => {}
                _ => best = Some(bucket),
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievements {
    /// A session of at least one hour without distractions
    pub no_distraction_1h: bool,
    /// Five hours of monitored time in total
    pub coding_marathon: bool,
    /// A session of at least 30 minutes without distractions
    pub perfect_session: bool,
    /// A distraction-free streak of at least one hour
    pub streak_master: bool,
}

impl Achievements {
    /// `sessions` must already be finalized
    pub fn from_sessions(sessions: &[Session], longest_streak: f64) -> Self {
        let total: f64 = sessions.iter().map(|s| s.total_time).sum();
        let clean = |min: f64| {
            sessions
                .iter()
                .any(|s| s.distractions.is_empty() && s.total_time >= min)
        };

        Self {
            no_distraction_1h: clean(ONE_HOUR),
            coding_marathon: total >= MARATHON,
            perfect_session: clean(HALF_HOUR),
            streak_master: longest_streak >= ONE_HOUR,
        }
    }

    pub fn earned(&self) -> Vec<&'static str> {
        let mut earned = Vec::new();
        if self.no_distraction_1h {
            earned.push("1 Hour Focused (No Distractions)");
        }
        if self.coding_marathon {
            earned.push("5 Hour Coding Marathon");
        }
        if self.perfect_session {
            earned.push("Perfect Session (No Distractions)");
        }
        if self.streak_master {
            earned.push("Focus Streak Master (1hr+)");
        }
        earned
    }
}

/// Full analysis document, also the on-disk export format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub session_summary: SessionSummary,
    pub time_distribution: TimeDistribution,
    pub top_activities: Vec<ActivityShare>,
    #[serde(default)]
    pub distraction_patterns: DistractionPatterns,
    #[serde(default)]
    pub achievements: Achievements,
    #[serde(default)]
    pub longest_streak_minutes: f64,
}

impl SessionAnalysis {
    /// Analyze `sessions`. A session without an end is closed at its last
    /// recorded timestamp; callers close a live session themselves.
    pub fn from_sessions(sessions: &[Session]) -> Self {
        let finalized: Vec<Session> = sessions
            .iter()
            .map(|s| s.finalized_at(s.last_recorded()))
            .collect();

        let elapsed: f64 = finalized.iter().map(|s| s.total_time).sum();
        let distracted: f64 = finalized
            .iter()
            .map(|s| s.distracted_time().min(s.total_time))
            .sum();
        let productive = (elapsed - distracted).max(0.0);
        let rate = percentage(productive, elapsed);

        let longest_streak = finalized
            .iter()
            .map(Session::longest_streak)
            .fold(0.0, f64::max);

        let distraction_count = finalized.iter().map(|s| s.distractions.len()).sum();
        let patterns = DistractionPatterns::from_times(
            finalized
                .iter()
                .flat_map(|s| s.distractions.iter().map(|d| &d.time)),
        );

        let summary = SessionSummary {
            goal: finalized.last().map(|s| s.goal.clone()).unwrap_or_default(),
            start_time: finalized.first().map(|s| s.start),
            end_time: finalized.last().and_then(|s| s.end),
            duration_minutes: round1(elapsed / 60.0),
            productivity_rate: round1(rate),
            distraction_count,
            blocks_triggered: finalized.iter().map(|s| s.blocks).sum(),
            session_count: finalized.len(),
        };

        Self {
            session_summary: summary,
            time_distribution: TimeDistribution {
                productive_minutes: round1(productive / 60.0),
                distracted_minutes: round1(distracted / 60.0),
                productivity_percentage: round1(rate),
            },
            top_activities: top_activities(&finalized, elapsed),
            distraction_patterns: patterns,
            achievements: Achievements::from_sessions(&finalized, longest_streak),
            longest_streak_minutes: round1(longest_streak / 60.0),
        }
    }

    /// Read an exported analysis
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse analysis: {}", path.display()))
    }

    /// Write this analysis as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize analysis")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write analysis: {}", path.display()))
    }

    /// `<dir>/focus_session_YYYYmmdd_HHMMSS.json`
    pub fn export_path(dir: &Path, at: NaiveDateTime) -> PathBuf {
        dir.join(format!("focus_session_{}.json", at.format("%Y%m%d_%H%M%S")))
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

fn top_activities(sessions: &[Session], elapsed: f64) -> Vec<ActivityShare> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for interval in sessions.iter().flat_map(|s| s.activities.iter()) {
        *totals.entry(interval.name.as_str()).or_default() += interval.duration();
    }

    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(TOP_ACTIVITY_LIMIT)
        .map(|(name, seconds)| ActivityShare {
            name: name.to_string(),
            duration_minutes: round1(seconds / 60.0),
            percentage: round1(percentage(seconds, elapsed)),
        })
        .collect()
}
