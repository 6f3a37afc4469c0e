//! Distraction blocking
//!
//! Blocking is advisory: it terminates the configured applications when it
//! can, and reports how many processes went away.

use anyhow::{bail, Result};
use guardian_core::process;

/// Terminates distracting applications
pub trait Blocker: Send + Sync {
    /// Returns the number of processes terminated
    fn block(&self, reason: &str) -> Result<usize>;
}

/// Kills processes whose names contain one of the configured targets
#[derive(Debug, Clone)]
pub struct ProcessBlocker {
    targets: Vec<String>,
}

impl ProcessBlocker {
    pub fn new(targets: Vec<String>) -> Self {
        Self { targets }
    }
}

impl Blocker for ProcessBlocker {
    fn block(&self, reason: &str) -> Result<usize> {
        if self.targets.is_empty() {
            bail!("no block targets configured");
        }

        let mut killed = 0;
        for target in &self.targets {
            if process::find_pids(target).is_empty() {
                tracing::debug!(target = target.as_str(), "not running");
                continue;
            }
            let n = process::terminate(target);
            if n > 0 {
                tracing::info!(target = target.as_str(), count = n, reason, "blocked application");
            }
            killed += n;
        }
        Ok(killed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_targets_is_error() {
        let blocker = ProcessBlocker::new(Vec::new());
        assert!(blocker.block("too many distractions").is_err());
    }

    #[test]
    fn test_absent_targets_kill_nothing() {
        let blocker = ProcessBlocker::new(vec!["no-such-browser-xyz".into()]);
        assert_eq!(blocker.block("too many distractions").unwrap(), 0);
    }
}
