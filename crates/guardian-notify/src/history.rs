//! Alert history tracking
//!
//! One line per alert: `timestamp|urgency|title|message`. Newlines inside the
//! message are flattened so every record stays on a single line.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::backend::Notification;

/// A record of a sent alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRecord {
    /// Unix timestamp when the alert was raised
    pub timestamp: i64,
    /// Urgency level
    pub urgency: String,
    pub title: String,
    pub message: String,
}

impl AlertRecord {
    /// Create a record from a notification
    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            urgency: notification.urgency.as_str().to_string(),
            title: flatten(&notification.title),
            message: flatten(&notification.message),
        }
    }

    pub fn datetime(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.timestamp, 0).single()
    }

    /// Format as a display string
    pub fn format(&self) -> String {
        let when = self
            .datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.to_string());
        format!("{} [{}] {}: {}", when, self.urgency, self.title, self.message)
    }

    fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}\n",
            self.timestamp, self.urgency, self.title, self.message
        )
    }

    fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.splitn(4, '|').collect();
        if parts.len() != 4 {
            return None;
        }

        Some(Self {
            timestamp: parts[0].parse().ok()?,
            urgency: parts[1].to_string(),
            title: parts[2].to_string(),
            message: parts[3].to_string(),
        })
    }
}

fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace('|', "/")
}

/// Alert history manager
#[derive(Debug, Clone)]
pub struct AlertHistory {
    history_file: PathBuf,
}

impl AlertHistory {
    /// Create a history manager writing to `history_file`
    pub fn new(history_file: &Path) -> Result<Self> {
        if let Some(parent) = history_file.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create alert history directory: {}", parent.display())
            })?;
        }

        Ok(Self {
            history_file: history_file.to_path_buf(),
        })
    }

    /// Append a notification to the history
    pub fn log(&self, notification: &Notification) -> Result<()> {
        let record = AlertRecord::from_notification(notification);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_file)
            .with_context(|| format!("Failed to open alert history: {}", self.history_file.display()))?;

        file.write_all(record.to_line().as_bytes())?;
        Ok(())
    }

    /// Get the most recent `limit` alerts, oldest first
    pub fn recent(&self, limit: usize) -> Result<Vec<AlertRecord>> {
        if !self.history_file.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.history_file)?;
        let reader = BufReader::new(file);

        let mut records: Vec<AlertRecord> = reader
            .lines()
            .map_while(|line| line.ok())
            .filter_map(|line| AlertRecord::parse_line(&line))
            .collect();

        if records.len() > limit {
            records = records.split_off(records.len() - limit);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Urgency;

    #[test]
    fn test_log_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let history = AlertHistory::new(&dir.path().join("nested/alerts")).unwrap();

        for i in 0..3 {
            let n = Notification::new(format!("distraction {}", i))
                .with_title("Focus Alert")
                .with_urgency(Urgency::Critical);
            history.log(&n).unwrap();
        }

        let recent = history.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "distraction 1");
        assert_eq!(recent[1].message, "distraction 2");
        assert_eq!(recent[1].urgency, "critical");
    }

    #[test]
    fn test_multiline_message_is_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let history = AlertHistory::new(&dir.path().join("alerts")).unwrap();

        history
            .log(&Notification::new("reason\n\nSuggestion: close the tab | now"))
            .unwrap();

        let recent = history.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "reason  Suggestion: close the tab / now");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = AlertHistory::new(&dir.path().join("alerts")).unwrap();
        assert!(history.recent(5).unwrap().is_empty());
    }
}
