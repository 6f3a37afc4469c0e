//! Screen capture through the platform's screenshot tool

use anyhow::{bail, Context, Result};
use guardian_core::process::command_exists;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::classifier::ScreenSample;

/// Produces screen samples. Implementations may block; the monitor calls
/// them from a blocking task.
pub trait ScreenSource: Send + Sync {
    fn capture(&self) -> Result<ScreenSample>;
}

/// Known screenshot tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTool {
    /// macOS screencapture
    Screencapture,
    /// Wayland grim
    Grim,
    GnomeScreenshot,
    Scrot,
    /// ImageMagick import
    Import,
}

impl CaptureTool {
    /// Detection order on Linux
    const LINUX: [CaptureTool; 4] = [
        CaptureTool::Grim,
        CaptureTool::GnomeScreenshot,
        CaptureTool::Scrot,
        CaptureTool::Import,
    ];

    /// Find a usable tool for this platform
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            return Some(Self::Screencapture);
        }

        Self::LINUX
            .into_iter()
            .find(|tool| command_exists(tool.program()))
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Screencapture => "screencapture",
            Self::Grim => "grim",
            Self::GnomeScreenshot => "gnome-screenshot",
            Self::Scrot => "scrot",
            Self::Import => "import",
        }
    }

    /// Arguments writing a full-screen PNG to `output`
    pub fn args(&self, output: &Path) -> Vec<String> {
        let output = output.display().to_string();
        match self {
            Self::Screencapture => vec!["-x".into(), output],
            Self::Grim => vec![output],
            Self::GnomeScreenshot => vec!["-f".into(), output],
            Self::Scrot => vec!["--overwrite".into(), output],
            Self::Import => vec!["-window".into(), "root".into(), output],
        }
    }
}

/// Captures by shelling out to a screenshot tool and reading the PNG back
#[derive(Debug)]
pub struct CommandCapture {
    tool: Option<CaptureTool>,
    scratch_dir: PathBuf,
    counter: AtomicU64,
}

impl CommandCapture {
    pub fn detect() -> Self {
        let tool = CaptureTool::detect();
        match tool {
            Some(t) => tracing::debug!(tool = t.program(), "screen capture tool detected"),
            None => tracing::warn!("no screenshot tool found; every poll will fail open"),
        }
        Self::with_tool(tool, std::env::temp_dir())
    }

    pub fn with_tool(tool: Option<CaptureTool>, scratch_dir: PathBuf) -> Self {
        Self {
            tool,
            scratch_dir,
            counter: AtomicU64::new(0),
        }
    }

    fn scratch_file(&self) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.scratch_dir
            .join(format!("focus-guardian-{}-{}.png", std::process::id(), n))
    }
}

impl ScreenSource for CommandCapture {
    fn capture(&self) -> Result<ScreenSample> {
        let Some(tool) = self.tool else {
            bail!("no screenshot tool available");
        };

        let path = self.scratch_file();
        let status = Command::new(tool.program())
            .args(tool.args(&path))
            .status()
            .with_context(|| format!("Failed to run {}", tool.program()));

        let result = match status {
            Ok(s) if s.success() => fs::read(&path)
                .with_context(|| format!("Failed to read screenshot: {}", path.display())),
            Ok(s) => Err(anyhow::anyhow!("{} exited with {}", tool.program(), s)),
            Err(e) => Err(e),
        };

        let _ = fs::remove_file(&path);

        let png = result?;
        if png.is_empty() {
            bail!("{} produced an empty screenshot", tool.program());
        }
        Ok(ScreenSample::new(png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_arguments() {
        let out = Path::new("/tmp/shot.png");
        assert_eq!(CaptureTool::Screencapture.args(out), vec!["-x", "/tmp/shot.png"]);
        assert_eq!(CaptureTool::GnomeScreenshot.args(out), vec!["-f", "/tmp/shot.png"]);
        assert_eq!(
            CaptureTool::Import.args(out),
            vec!["-window", "root", "/tmp/shot.png"]
        );
        assert_eq!(CaptureTool::Grim.program(), "grim");
    }

    #[test]
    fn test_no_tool_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::with_tool(None, dir.path().to_path_buf());
        assert!(capture.capture().is_err());
    }

    #[test]
    fn test_scratch_files_are_unique() {
        let capture = CommandCapture::with_tool(None, PathBuf::from("/tmp"));
        assert_ne!(capture.scratch_file(), capture.scratch_file());
    }
}
