//! Standard paths used by Focus Guardian

use std::path::{Path, PathBuf};

/// Application directory name under the platform data/config roots
pub const APP_DIR: &str = "focus-guardian";

/// Standard Focus Guardian paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/focus-guardian)
    pub data: PathBuf,
    /// Config directory (~/.config/focus-guardian)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join(APP_DIR);

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR);

        Self { data, config }
    }

    /// Paths rooted at an arbitrary directory (used by tests)
    pub fn rooted(root: &Path) -> Self {
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    /// Persisted session history
    pub fn sessions_file(&self) -> PathBuf {
        self.data.join("sessions.json")
    }

    /// Directory holding exported session analyses
    pub fn analyses_dir(&self) -> PathBuf {
        self.data.join("analyses")
    }

    /// Alert history log
    pub fn alert_history(&self) -> PathBuf {
        self.data.join("alerts")
    }

    /// Default configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_layout() {
        let paths = Paths::rooted(Path::new("/tmp/fg"));
        assert_eq!(paths.sessions_file(), PathBuf::from("/tmp/fg/data/sessions.json"));
        assert_eq!(paths.analyses_dir(), PathBuf::from("/tmp/fg/data/analyses"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/fg/config/config.toml"));
    }

    #[test]
    fn test_default_paths_end_with_app_dir() {
        let paths = Paths::new();
        assert!(paths.data.ends_with(APP_DIR));
        assert!(paths.config.ends_with(APP_DIR));
    }
}
