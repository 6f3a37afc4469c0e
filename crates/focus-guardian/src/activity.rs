//! Activity-duration attribution
//!
//! Poll ticks don't line up with activity changes, so time is attributed by
//! closing the previous interval when the next observation arrives: the
//! duration of activity N is `t(N+1) - t(N)`. The open interval is only
//! closed at stop, or virtually when a summary is requested.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::session::{seconds_between, timestamp, truncate};

/// A closed span of time attributed to one observed activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityInterval {
    pub name: String,
    #[serde(with = "timestamp")]
    pub start: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub end: NaiveDateTime,
    /// Whether the classifier judged the activity aligned with the goal
    pub productive: bool,
}

impl ActivityInterval {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        seconds_between(self.start, self.end)
    }
}

#[derive(Debug, Clone)]
struct OpenActivity {
    name: String,
    productive: bool,
    since: NaiveDateTime,
}

/// Tracks the currently observed activity for one session
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    current: Option<OpenActivity>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation at `at`.
    ///
    /// Returns the interval closed by this observation. Re-observing the same
    /// activity with the same verdict extends the open interval instead.
    pub fn observe(
        &mut self,
        name: &str,
        productive: bool,
        at: NaiveDateTime,
    ) -> Option<ActivityInterval> {
        let at = truncate(at);

        if let Some(open) = &self.current {
            if open.name == name && open.productive == productive {
                return None;
            }
        }

        let closed = self.close(at);
        self.current = Some(OpenActivity {
            name: name.to_string(),
            productive,
            since: at,
        });
        closed
    }

    /// Close the open interval at `at`, leaving nothing open
    pub fn close(&mut self, at: NaiveDateTime) -> Option<ActivityInterval> {
        let open = self.current.take()?;
        Some(ActivityInterval {
            name: open.name,
            start: open.since,
            end: truncate(at).max(open.since),
            productive: open.productive,
        })
    }

    /// The open interval as if it were closed at `at`, without closing it
    pub fn peek(&self, at: NaiveDateTime) -> Option<ActivityInterval> {
        self.clone().close(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;

    #[test]
    fn test_previous_interval_closes_on_next_observation() {
        let mut tracker = ActivityTracker::new();
        assert!(tracker.observe("VS Code", true, at(9, 0, 0)).is_none());

        let closed = tracker.observe("YouTube", false, at(9, 7, 30)).unwrap();
        assert_eq!(closed.name, "VS Code");
        assert!(closed.productive);
        assert_eq!(closed.duration(), 450.0);
        assert_eq!(tracker.peek(at(9, 8, 0)).unwrap().name, "YouTube");
    }

    #[test]
    fn test_same_activity_extends_open_interval() {
        let mut tracker = ActivityTracker::new();
        tracker.observe("VS Code", true, at(9, 0, 0));
        assert!(tracker.observe("VS Code", true, at(9, 0, 10)).is_none());
        assert!(tracker.observe("VS Code", true, at(9, 0, 20)).is_none());

        let closed = tracker.close(at(9, 1, 0)).unwrap();
        assert_eq!(closed.start, at(9, 0, 0));
        assert_eq!(closed.duration(), 60.0);
    }

    #[test]
    fn test_verdict_change_splits_interval() {
        let mut tracker = ActivityTracker::new();
        tracker.observe("YouTube", true, at(9, 0, 0));
        let closed = tracker.observe("YouTube", false, at(9, 5, 0)).unwrap();
        assert!(closed.productive);
        assert_eq!(closed.duration(), 300.0);
    }

    #[test]
    fn test_peek_does_not_close() {
        let mut tracker = ActivityTracker::new();
        tracker.observe("Docs", true, at(9, 0, 0));

        let peeked = tracker.peek(at(9, 2, 0)).unwrap();
        assert_eq!(peeked.duration(), 120.0);

        let closed = tracker.close(at(9, 3, 0)).unwrap();
        assert_eq!(closed.name, "Docs");
        assert_eq!(closed.duration(), 180.0);
    }

    #[test]
    fn test_close_when_idle() {
        let mut tracker = ActivityTracker::new();
        assert!(tracker.close(at(9, 0, 0)).is_none());
        assert!(tracker.peek(at(9, 0, 0)).is_none());
    }
}
