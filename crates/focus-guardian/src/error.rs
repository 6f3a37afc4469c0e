//! Error kinds surfaced by the focus controller and its collaborators

use thiserror::Error;

/// Focus Guardian errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardianError {
    /// Missing or invalid credentials/settings; fatal before monitoring starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single poll's external call failed; recovered locally
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// History file unreadable or unwritable; monitoring continues in memory
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Rejected input, e.g. an empty goal
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl GuardianError {
    /// Whether this error should terminate the process before monitoring
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(GuardianError::Configuration("no key".into()).is_fatal());
        assert!(GuardianError::Validation("empty goal".into()).is_fatal());
        assert!(!GuardianError::Classifier("timeout".into()).is_fatal());
        assert!(!GuardianError::Persistence("disk full".into()).is_fatal());
        assert!(!GuardianError::InvalidState("no session".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = GuardianError::InvalidState("No active focus session".into());
        assert_eq!(err.to_string(), "Invalid state: No active focus session");
    }
}
