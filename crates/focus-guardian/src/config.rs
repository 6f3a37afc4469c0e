//! Configuration loading for focus-guardian

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GuardianError;

/// Environment variable checked first for the API key
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Focus Guardian configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of an OpenAI-compatible chat completions API
    pub api_base: String,

    /// API key (prefer the environment variable or key file)
    pub api_key: Option<String>,

    /// File holding the API key, relative to the working directory
    pub api_key_file: PathBuf,

    /// Vision model used to identify on-screen activity
    pub vision_model: String,

    /// Text model used to derive goal rules and validate activities
    pub text_model: String,

    /// Upper bound for one poll (capture + all model calls)
    pub request_timeout_secs: u64,

    /// Seconds between polls
    pub interval_secs: u64,

    /// Distractions before strict mode blocks
    pub strike_threshold: u32,

    /// Minimum vision confidence (exclusive, 1-100) for a detection to count
    pub confidence_threshold: f64,

    /// Process names terminated by a block
    pub block_targets: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            api_key_file: PathBuf::from("api.txt"),
            vision_model: "llama-3.2-11b-vision-preview".to_string(),
            text_model: "llama3-70b-8192".to_string(),
            request_timeout_secs: 20,
            interval_secs: 10,
            strike_threshold: 3,
            confidence_threshold: 65.0,
            block_targets: default_block_targets(),
        }
    }
}

fn default_block_targets() -> Vec<String> {
    ["chrome", "firefox", "safari", "msedge"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    /// Load configuration from `path`, or use defaults when it doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        Self::from_toml(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the API key: environment, then config value, then key file
    pub fn api_key(&self) -> Result<String, GuardianError> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env_value: Option<String>) -> Result<String, GuardianError> {
        let from_env = env_value.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        if let Some(key) = from_env {
            return Ok(key);
        }

        let from_config = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        if let Some(key) = from_config {
            return Ok(key.to_string());
        }

        let content = fs::read_to_string(&self.api_key_file).map_err(|e| {
            GuardianError::Configuration(format!(
                "no API key: set {}, api_key in the config, or create {} ({})",
                API_KEY_ENV,
                self.api_key_file.display(),
                e
            ))
        })?;

        let key = content.trim();
        if key.is_empty() {
            return Err(GuardianError::Configuration(format!(
                "API key file {} is empty",
                self.api_key_file.display()
            )));
        }
        Ok(key.to_string())
    }

    /// Check values that would make monitoring meaningless
    pub fn validate(&self) -> Result<(), GuardianError> {
        if self.interval_secs == 0 {
            return Err(GuardianError::Configuration("interval must be at least 1 second".into()));
        }
        if self.strike_threshold == 0 {
            return Err(GuardianError::Configuration("strike threshold must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(GuardianError::Configuration("request timeout must be at least 1 second".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.interval_secs, 10);
        assert_eq!(config.strike_threshold, 3);
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.confidence_threshold, 65.0);
        assert!(config.block_targets.contains(&"chrome".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            interval_secs = 5
            block_targets = ["firefox"]
            "#,
        )
        .unwrap();

        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.block_targets, vec!["firefox".to_string()]);
        assert_eq!(config.strike_threshold, 3);
        assert_eq!(config.api_base, Config::default().api_base);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml("interval_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_api_key_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("api.txt");
        fs::write(&key_file, "file-key\n").unwrap();

        let mut config = Config {
            api_key_file: key_file,
            ..Config::default()
        };
        assert_eq!(config.api_key_with_env(None).unwrap(), "file-key");

        config.api_key = Some("config-key".into());
        assert_eq!(config.api_key_with_env(None).unwrap(), "config-key");
        assert_eq!(
            config.api_key_with_env(Some("env-key".into())).unwrap(),
            "env-key"
        );
        assert_eq!(
            config.api_key_with_env(Some("  ".into())).unwrap(),
            "config-key"
        );
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            api_key_file: dir.path().join("missing.txt"),
            ..Config::default()
        };

        let err = config.api_key_with_env(None).unwrap_err();
        assert!(matches!(err, GuardianError::Configuration(_)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = Config {
            interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
