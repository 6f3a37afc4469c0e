//! Session history storage
//!
//! The full history lives in one JSON array (`sessions.json` in the data
//! directory). It is read once at startup and rewritten on every stop, via a
//! temp file in the same directory followed by a rename so a crash never
//! leaves a truncated file behind. A file that cannot be parsed is moved
//! aside with [`SessionStore::quarantine`] before anything overwrites it.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::GuardianError;
use crate::session::Session;

/// Session history store
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the JSON file at `path`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every persisted session, oldest first. A missing or blank file is
    /// an empty history.
    pub fn load(&self) -> Result<Vec<Session>, GuardianError> {
        self.read().map_err(|e| GuardianError::Persistence(format!("{:#}", e)))
    }

    /// Replace the persisted history with `sessions`
    pub fn save(&self, sessions: &[Session]) -> Result<(), GuardianError> {
        self.write(sessions)
            .map_err(|e| GuardianError::Persistence(format!("{:#}", e)))
    }

    /// Move an unreadable history file aside as
    /// `<name>.corrupt-YYYYmmdd_HHMMSS` and return the new path
    pub fn quarantine(&self, at: NaiveDateTime) -> Result<PathBuf, GuardianError> {
        let backup = self.path.with_file_name(format!(
            "{}.corrupt-{}",
            self.file_name(),
            at.format("%Y%m%d_%H%M%S")
        ));
        fs::rename(&self.path, &backup)
            .with_context(|| {
                format!(
                    "Failed to move unreadable session history aside: {}",
                    self.path.display()
                )
            })
            .map_err(|e| GuardianError::Persistence(format!("{:#}", e)))?;
        Ok(backup)
    }

    fn read(&self) -> Result<Vec<Session>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session history: {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session history: {}", self.path.display()))
    }

    fn write(&self, sessions: &[Session]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;

        let content =
            serde_json::to_string_pretty(sessions).context("Failed to serialize session history")?;

        let tmp_path = self.temp_path();
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create temp file: {}", tmp_path.display()))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .with_context(|| format!("Failed to write temp file: {}", tmp_path.display()))?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e).with_context(|| {
                format!("Failed to replace session history: {}", self.path.display())
            });
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!(".{}.{}.tmp", self.file_name(), std::process::id()))
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sessions.json".to_string())
    }
}
