//! Alert sounds
//!
//! Plays a short system sound whose intensity follows the alert urgency.
//! Uses whatever player the platform ships with and falls back to the
//! terminal bell.

use anyhow::{bail, Result};
use std::io::Write;
use std::process::Command;

use crate::backend::Urgency;

/// Available sound players
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    /// macOS afplay with the bundled system sounds
    Afplay,
    /// PulseAudio/PipeWire paplay with freedesktop sounds
    Paplay,
    /// ASCII BEL on stderr
    Bell,
}

impl Player {
    /// Detect the best available player for the current platform
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") && crate::command_exists("afplay") {
            return Self::Afplay;
        }
        if cfg!(target_os = "linux") && crate::command_exists("paplay") {
            return Self::Paplay;
        }
        Self::Bell
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Afplay => "afplay",
            Self::Paplay => "paplay",
            Self::Bell => "bell",
        }
    }

    /// Sound file used for an urgency level, if this player uses files
    pub fn sound_file(&self, urgency: Urgency) -> Option<&'static str> {
        match (self, urgency) {
            (Self::Afplay, Urgency::Low) => Some("/System/Library/Sounds/Tink.aiff"),
            (Self::Afplay, Urgency::Normal) => Some("/System/Library/Sounds/Glass.aiff"),
            (Self::Afplay, Urgency::Critical) => Some("/System/Library/Sounds/Basso.aiff"),
            (Self::Paplay, Urgency::Low) => Some("/usr/share/sounds/freedesktop/stereo/message.oga"),
            (Self::Paplay, Urgency::Normal) => {
                Some("/usr/share/sounds/freedesktop/stereo/dialog-warning.oga")
            }
            (Self::Paplay, Urgency::Critical) => {
                Some("/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga")
            }
            (Self::Bell, _) => None,
        }
    }

    /// Number of bells rung for an urgency level
    pub fn bell_count(urgency: Urgency) -> usize {
        match urgency {
            Urgency::Low => 1,
            Urgency::Normal => 2,
            Urgency::Critical => 3,
        }
    }

    /// Play the sound for `urgency`. Blocks until playback ends.
    pub fn play(&self, urgency: Urgency) -> Result<()> {
        let Some(file) = self.sound_file(urgency) else {
            return ring_bell(Self::bell_count(urgency));
        };

        let status = Command::new(self.name()).arg(file).status()?;
        if !status.success() {
            bail!("{} failed with status: {}", self.name(), status);
        }
        Ok(())
    }
}

fn ring_bell(times: usize) -> Result<()> {
    let mut stderr = std::io::stderr();
    stderr.write_all("\x07".repeat(times).as_bytes())?;
    stderr.flush()?;
    Ok(())
}
