//! Focus session model
//!
//! A session is one contiguous monitored interval between start and stop. It
//! records the goal, every distraction the classifier flagged, and the
//! activity intervals observed along the way. Timestamps are local wall-clock
//! time at one-second resolution, stored as `YYYY-MM-DD HH:MM:SS`.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::activity::ActivityInterval;

/// Format used for every persisted timestamp
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time truncated to whole seconds
pub fn local_now() -> NaiveDateTime {
    truncate(Local::now().naive_local())
}

/// Drop sub-second precision so timestamps survive a save/load cycle unchanged
pub fn truncate(time: NaiveDateTime) -> NaiveDateTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Seconds between two timestamps, never negative
pub fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds().max(0) as f64 / 1000.0
}

/// Serde adapter for `YYYY-MM-DD HH:MM:SS` timestamps
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIME_FORMAT).map_err(serde::de::Error::custom)
    }

    /// Nullable variant
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::TIME_FORMAT;

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => serializer.serialize_str(&t.format(TIME_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => NaiveDateTime::parse_from_str(&raw, TIME_FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

/// A single poll tick where the activity was judged off-goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionEvent {
    #[serde(with = "timestamp")]
    pub time: NaiveDateTime,
    /// Free-text description of the offending activity
    pub domains: String,
}

/// A focus session, active or completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(with = "timestamp")]
    pub start: NaiveDateTime,
    /// Unset while the session is active
    #[serde(with = "timestamp::option", default)]
    pub end: Option<NaiveDateTime>,
    pub goal: String,
    #[serde(default)]
    pub distractions: Vec<DistractionEvent>,
    /// Total active duration in seconds
    #[serde(default)]
    pub total_time: f64,
    /// Observed activity intervals, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<ActivityInterval>,
    /// Block actions triggered during the session
    #[serde(default, skip_serializing_if = "is_zero")]
    pub blocks: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Session {
    /// Begin a new session at `start`
    pub fn new(goal: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            start: truncate(start),
            end: None,
            goal: goal.into(),
            distractions: Vec::new(),
            total_time: 0.0,
            activities: Vec::new(),
            blocks: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// Record a distraction. Timestamps never go backwards: an earlier `time`
    /// is clamped to the previous event's.
    pub fn record_distraction(&mut self, time: NaiveDateTime, domains: impl Into<String>) {
        let mut time = truncate(time);
        if let Some(last) = self.distractions.last() {
            time = time.max(last.time);
        }
        self.distractions.push(DistractionEvent {
            time,
            domains: domains.into(),
        });
    }

    /// Close the session at `end`
    pub fn finish(&mut self, end: NaiveDateTime) {
        let end = truncate(end).max(self.start);
        self.end = Some(end);
        self.total_time = seconds_between(self.start, end);
    }

    /// Seconds spent on activities judged off-goal
    pub fn distracted_time(&self) -> f64 {
        self.activities
            .iter()
            .filter(|a| !a.productive)
            .map(ActivityInterval::duration)
            .sum()
    }

    /// Latest timestamp the session itself records: its end, or for an open
    /// session the last distraction or activity boundary
    pub fn last_recorded(&self) -> NaiveDateTime {
        if let Some(end) = self.end {
            return end;
        }
        let last_distraction = self.distractions.last().map(|d| d.time);
        let last_activity = self.activities.iter().map(|a| a.end).max();
        [Some(self.start), last_distraction, last_activity]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(self.start)
    }

    /// Longest distraction-free stretch in seconds, bounded by the session
    /// start, each distraction, and [`Session::last_recorded`].
    pub fn longest_streak(&self) -> f64 {
        let end = self.last_recorded();
        let mut previous = self.start;
        let mut longest: f64 = 0.0;

        for event in &self.distractions {
            longest = longest.max(seconds_between(previous, event.time));
            previous = event.time;
        }

        longest.max(seconds_between(previous, end))
    }

    /// Copy of this session closed as of `now`; completed sessions are returned as-is
    pub fn finalized_at(&self, now: NaiveDateTime) -> Self {
        let mut snapshot = self.clone();
        if snapshot.is_active() {
            snapshot.finish(now);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;

    #[test]
    fn test_finish_computes_total_time() {
        let mut session = Session::new("Write report", at(9, 0, 0));
        assert!(session.is_active());

        session.finish(at(9, 30, 0));
        assert!(!session.is_active());
        assert_eq!(session.end, Some(at(9, 30, 0)));
        assert_eq!(session.total_time, 1800.0);
    }

    #[test]
    fn test_distraction_times_never_decrease() {
        let mut session = Session::new("Write report", at(9, 0, 0));
        session.record_distraction(at(9, 10, 0), "youtube.com");
        session.record_distraction(at(9, 5, 0), "reddit.com");

        assert_eq!(session.distractions[1].time, at(9, 10, 0));
        assert_eq!(session.distractions[1].domains, "reddit.com");
    }

    #[test]
    fn test_longest_streak_uses_gaps() {
        let mut session = Session::new("Write report", at(9, 0, 0));
        session.record_distraction(at(9, 10, 0), "youtube.com");
        session.record_distraction(at(9, 50, 0), "youtube.com");
        session.finish(at(10, 0, 0));

        assert_eq!(session.longest_streak(), 2400.0);
    }

    #[test]
    fn test_open_session_ends_at_last_record() {
        let mut session = Session::new("Write report", at(9, 0, 0));
        assert_eq!(session.last_recorded(), at(9, 0, 0));

        session.record_distraction(at(9, 20, 0), "youtube.com");
        session.activities.push(ActivityInterval {
            name: "VS Code".into(),
            start: at(9, 20, 0),
            end: at(9, 50, 0),
            productive: true,
        });

        assert_eq!(session.last_recorded(), at(9, 50, 0));
        assert_eq!(session.longest_streak(), 1800.0);
        assert_eq!(session.finalized_at(at(9, 55, 0)).longest_streak(), 2100.0);
    }

    #[test]
    fn test_json_shape() {
        let mut session = Session::new("Write report", at(9, 0, 0));
        session.record_distraction(at(9, 10, 0), "youtube.com");
        session.finish(at(9, 30, 0));

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["start"], "2024-03-14 09:00:00");
        assert_eq!(value["end"], "2024-03-14 09:30:00");
        assert_eq!(value["distractions"][0]["time"], "2024-03-14 09:10:00");
        assert_eq!(value["distractions"][0]["domains"], "youtube.com");
        assert_eq!(value["total_time"], 1800.0);
        assert!(value.get("activities").is_none());
        assert!(value.get("blocks").is_none());
    }

    #[test]
    fn test_active_session_serializes_null_end() {
        let session = Session::new("Write report", at(9, 0, 0));
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"end\":null"));

        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_finalized_at_leaves_original_untouched() {
        let session = Session::new("Write report", at(9, 0, 0));
        let snapshot = session.finalized_at(at(9, 45, 0));

        assert!(session.is_active());
        assert_eq!(snapshot.total_time, 2700.0);
    }
}
