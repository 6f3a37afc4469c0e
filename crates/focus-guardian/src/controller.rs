//! Focus session controller
//!
//! Owns the active session and applies the escalation policy to each poll
//! outcome. The controller never calls the classifier itself: the monitor
//! loop produces a [`PollOutcome`] and hands it over, which keeps every state
//! transition here synchronous and testable with a fixed clock.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::activity::ActivityTracker;
use crate::alert::{message_for, title_for, AlertRenderer};
use crate::analysis::SessionAnalysis;
use crate::block::Blocker;
use crate::classifier::{Classification, PollOutcome, Severity};
use crate::error::GuardianError;
use crate::session::{local_now, seconds_between, Session};
use crate::store::SessionStore;

/// Default number of strict-mode distractions before a block
pub const DEFAULT_STRIKE_THRESHOLD: u32 = 3;

/// Title of the popup shown when applications are closed
pub const BLOCK_TITLE: &str = "DISTRACTION BLOCKED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Block after repeated distractions
    pub strict: bool,
    pub strike_threshold: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            strict: false,
            strike_threshold: DEFAULT_STRIKE_THRESHOLD,
        }
    }
}

/// What the controller did with one poll outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intervention {
    /// Nothing to do (on track, failed poll, or no active session)
    None,
    /// Distraction recorded and the user warned
    Warned { strikes: u32 },
    /// Distraction recorded and the strike threshold reached
    Blocked,
}

pub struct FocusController {
    options: ControllerOptions,
    store: SessionStore,
    alerts: Arc<dyn AlertRenderer>,
    blocker: Box<dyn Blocker>,
    history: Vec<Session>,
    active: Option<Session>,
    tracker: ActivityTracker,
    escalation_count: u32,
    current_streak: f64,
    longest_streak: f64,
    last_distraction: Option<NaiveDateTime>,
    last_poll: Option<NaiveDateTime>,
    /// False when unreadable history could not be moved aside
    persist: bool,
}

impl FocusController {
    /// Create a controller, loading prior history from `store`.
    ///
    /// An unreadable history file is moved aside and treated as empty. If it
    /// cannot be moved, this controller never writes the store.
    pub fn new(
        options: ControllerOptions,
        store: SessionStore,
        alerts: Arc<dyn AlertRenderer>,
        blocker: Box<dyn Blocker>,
    ) -> Self {
        let mut persist = true;
        let history = match store.load() {
            Ok(sessions) => sessions,
            Err(e) => {
                match store.quarantine(local_now()) {
                    Ok(backup) => tracing::warn!(
                        backup = %backup.display(),
                        "{}; starting with empty history",
                        e
                    ),
                    Err(moved) => {
                        tracing::error!(
                            path = %store.path().display(),
                            "{}; {}; history will not be saved this run",
                            e,
                            moved
                        );
                        persist = false;
                    }
                }
                Vec::new()
            }
        };

        Self {
            options,
            store,
            alerts,
            blocker,
            history,
            active: None,
            tracker: ActivityTracker::new(),
            escalation_count: 0,
            current_streak: 0.0,
            longest_streak: 0.0,
            last_distraction: None,
            last_poll: None,
            persist,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    /// Completed sessions, oldest first
    pub fn history(&self) -> &[Session] {
        &self.history
    }

    pub fn escalation_count(&self) -> u32 {
        self.escalation_count
    }

    pub fn current_streak(&self) -> f64 {
        self.current_streak
    }

    pub fn longest_streak(&self) -> f64 {
        self.longest_streak
    }

    /// When the last poll outcome was applied
    pub fn last_poll(&self) -> Option<NaiveDateTime> {
        self.last_poll
    }

    pub fn start(&mut self, goal: &str) -> Result<&Session, GuardianError> {
        self.start_at(goal, local_now())
    }

    /// Begin a session for `goal`
    pub fn start_at(&mut self, goal: &str, now: NaiveDateTime) -> Result<&Session, GuardianError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(GuardianError::Validation("goal must not be empty".into()));
        }
        if let Some(active) = &self.active {
            return Err(GuardianError::InvalidState(format!(
                "a session for '{}' is already active",
                active.goal
            )));
        }

        self.escalation_count = 0;
        self.current_streak = 0.0;
        self.last_distraction = None;
        self.last_poll = None;
        self.tracker = ActivityTracker::new();

        tracing::info!(goal, strict = self.options.strict, "session started");
        Ok(self.active.insert(Session::new(goal, now)))
    }

    pub fn apply(&mut self, outcome: PollOutcome) -> Intervention {
        self.apply_at(outcome, local_now())
    }

    /// Apply one poll outcome observed at `now`
    pub fn apply_at(&mut self, outcome: PollOutcome, now: NaiveDateTime) -> Intervention {
        let Some(session) = self.active.as_ref() else {
            tracing::debug!("discarding poll outcome: no active session");
            return Intervention::None;
        };
        let since = self.last_distraction.unwrap_or(session.start);
        self.last_poll = Some(now);

        match outcome {
            PollOutcome::OnTrack { activity } => {
                if let Some(name) = activity {
                    self.observe(&name, true, now);
                }
                self.current_streak = seconds_between(since, now);
                Intervention::None
            }
            PollOutcome::ClassifierFailed { error } => {
                tracing::warn!(%error, "classification failed; treating poll as on track");
                self.current_streak = seconds_between(since, now);
                Intervention::None
            }
            PollOutcome::Distraction { activity, result } => {
                self.distraction(activity, result, since, now)
            }
        }
    }

    fn distraction(
        &mut self,
        activity: Option<String>,
        result: Classification,
        since: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Intervention {
        let domains = activity.clone().unwrap_or_else(|| result.reason.clone());
        if let Some(name) = &activity {
            self.observe(name, false, now);
        }
        if let Some(session) = self.active.as_mut() {
            session.record_distraction(now, domains.as_str());
        }

        self.current_streak = seconds_between(since, now);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.current_streak = 0.0;
        self.last_distraction = Some(now);

        tracing::info!(
            activity = domains.as_str(),
            severity = result.severity.as_str(),
            reason = result.reason.as_str(),
            "distraction detected"
        );

        if self.options.strict {
            self.escalation_count += 1;
        }

        self.alerts.play_sound(result.severity);
        self.alerts
            .show(title_for(result.severity), &message_for(&result), result.severity);

        if self.options.strict && self.escalation_count >= self.options.strike_threshold {
            let reason = format!(
                "{} distractions while focusing on your goal",
                self.escalation_count
            );
            self.block(&reason);
            self.escalation_count = 0;
            return Intervention::Blocked;
        }

        Intervention::Warned {
            strikes: self.escalation_count,
        }
    }

    fn observe(&mut self, name: &str, productive: bool, now: NaiveDateTime) {
        if let Some(closed) = self.tracker.observe(name, productive, now) {
            if let Some(session) = self.active.as_mut() {
                session.activities.push(closed);
            }
        }
    }

    /// Close distracting applications. Failures are logged, never raised.
    pub fn block(&mut self, reason: &str) {
        match self.blocker.block(reason) {
            Ok(killed) => tracing::info!(killed, reason, "block triggered"),
            Err(e) => tracing::warn!(reason, "block failed: {:#}", e),
        }

        self.alerts.play_sound(Severity::High);
        self.alerts.show(
            BLOCK_TITLE,
            &format!("Closing distracting applications: {}", reason),
            Severity::High,
        );

        if let Some(session) = self.active.as_mut() {
            session.blocks += 1;
        }
    }

    pub fn stop(&mut self) -> Result<Session, GuardianError> {
        self.stop_at(local_now())
    }

    /// End the active session, append it to history and persist.
    ///
    /// A persistence failure is logged; the session is still kept in memory.
    pub fn stop_at(&mut self, now: NaiveDateTime) -> Result<Session, GuardianError> {
        let Some(mut session) = self.active.take() else {
            return Err(GuardianError::InvalidState("no active session".into()));
        };

        if let Some(closed) = self.tracker.close(now) {
            session.activities.push(closed);
        }
        session.finish(now);

        let since = self.last_distraction.unwrap_or(session.start);
        let end = session.end.unwrap_or(now);
        self.current_streak = seconds_between(since, end);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.escalation_count = 0;

        self.history.push(session.clone());
        if !self.persist {
            tracing::warn!(path = %self.store.path().display(), "session kept in memory only");
        } else if let Err(e) = self.store.save(&self.history) {
            tracing::error!(path = %self.store.path().display(), "{}", e);
        }

        tracing::info!(
            goal = session.goal.as_str(),
            seconds = session.total_time,
            distractions = session.distractions.len(),
            "session stopped"
        );
        Ok(session)
    }

    pub fn summarize(&self) -> SessionAnalysis {
        self.summarize_at(local_now())
    }

    /// Analysis over history plus the active session as of `now`
    pub fn summarize_at(&self, now: NaiveDateTime) -> SessionAnalysis {
        let mut sessions = self.history.clone();
        if let Some(active) = &self.active {
            let mut snapshot = active.finalized_at(now);
            if let Some(open) = self.tracker.peek(now) {
                snapshot.activities.push(open);
            }
            sessions.push(snapshot);
        }
        SessionAnalysis::from_sessions(&sessions)
    }
}
