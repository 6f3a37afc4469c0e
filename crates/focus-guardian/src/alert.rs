//! Alert rendering
//!
//! Alerts are fire-and-forget: every notification and sound runs on its own
//! detached thread so a slow notification daemon or audio device can never
//! hold up the next poll. Threads still running at exit are abandoned.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use guardian_notify::{AlertHistory, Backend, Notification, Player, Urgency};

use crate::classifier::{Classification, Severity};

/// Seconds before a popup notification auto-dismisses
const POPUP_TIMEOUT_SECS: u32 = 10;

/// Presents alerts to the user. Both calls must return immediately.
pub trait AlertRenderer: Send + Sync {
    fn show(&self, title: &str, message: &str, severity: Severity);
    fn play_sound(&self, severity: Severity);
}

impl From<Severity> for Urgency {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Urgency::Low,
            Severity::Medium => Urgency::Normal,
            Severity::High => Urgency::Critical,
        }
    }
}

/// Popup title for a distraction of the given severity
pub fn title_for(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "URGENT FOCUS ALERT",
        Severity::Medium => "Focus Alert",
        Severity::Low => "Mild Focus Alert",
    }
}

/// Popup body for a distraction verdict
pub fn message_for(result: &Classification) -> String {
    match &result.suggestion {
        Some(tip) => format!("{}\n\nTip: {}", result.reason, tip),
        None => result.reason.clone(),
    }
}

/// Desktop notifications and system sounds
pub struct DesktopAlerts {
    popup: bool,
    sound: bool,
    backend: Backend,
    player: Player,
    history: Option<Arc<AlertHistory>>,
}

impl DesktopAlerts {
    /// Detect platform backends. `history_file` records every popup shown.
    pub fn new(popup: bool, sound: bool, history_file: &Path) -> Self {
        let history = match AlertHistory::new(history_file) {
            Ok(h) => Some(Arc::new(h)),
            Err(e) => {
                tracing::warn!("alert history disabled: {:#}", e);
                None
            }
        };

        let backend = Backend::detect();
        let player = Player::detect();
        tracing::debug!(backend = backend.name(), player = player.name(), "alert backends detected");

        Self {
            popup,
            sound,
            backend,
            player,
            history,
        }
    }
}

impl AlertRenderer for DesktopAlerts {
    fn show(&self, title: &str, message: &str, severity: Severity) {
        if !self.popup {
            return;
        }

        let notification = Notification::new(message)
            .with_title(title)
            .with_urgency(severity.into())
            .with_timeout(POPUP_TIMEOUT_SECS);
        let backend = self.backend;
        let history = self.history.clone();

        thread::spawn(move || {
            if let Err(e) = backend.send(&notification) {
                tracing::warn!(backend = backend.name(), "notification failed: {:#}", e);
            }
            if let Some(history) = history {
                if let Err(e) = history.log(&notification) {
                    tracing::debug!("failed to record alert: {:#}", e);
                }
            }
        });
    }

    fn play_sound(&self, severity: Severity) {
        if !self.sound {
            return;
        }

        let player = self.player;
        thread::spawn(move || {
            if let Err(e) = player.play(severity.into()) {
                tracing::debug!(player = player.name(), "sound failed: {:#}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_follow_severity() {
        assert_eq!(title_for(Severity::High), "URGENT FOCUS ALERT");
        assert_eq!(title_for(Severity::Medium), "Focus Alert");
        assert_eq!(title_for(Severity::Low), "Mild Focus Alert");
    }

    #[test]
    fn test_message_includes_suggestion() {
        let mut result = Classification {
            allowed: false,
            reason: "Watching gaming videos".into(),
            suggestion: Some("Close YouTube".into()),
            severity: Severity::High,
        };
        assert_eq!(message_for(&result), "Watching gaming videos\n\nTip: Close YouTube");

        result.suggestion = None;
        assert_eq!(message_for(&result), "Watching gaming videos");
    }

    #[test]
    fn test_severity_to_urgency() {
        assert_eq!(Urgency::from(Severity::Low), Urgency::Low);
        assert_eq!(Urgency::from(Severity::Medium), Urgency::Normal);
        assert_eq!(Urgency::from(Severity::High), Urgency::Critical);
    }

    #[test]
    fn test_disabled_alerts_do_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let history_file = dir.path().join("alerts");
        let alerts = DesktopAlerts::new(false, false, &history_file);

        alerts.show("Focus Alert", "ignored", Severity::High);
        alerts.play_sound(Severity::High);

        assert!(!history_file.exists());
    }
}
