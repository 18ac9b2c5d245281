//! Logging configuration from TOML (`[logging]` section)
//!
//! ```toml
//! [logging]
//! file = "~/.local/state/tally/tally.log"   # diagnostic log, in addition to stderr
//! audit_log = "verification.jsonl"          # JSONL audit trail of verification attempts
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging destinations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Diagnostic log file
    pub file: Option<PathBuf>,
    /// JSONL audit log of verification events
    pub audit_log: Option<PathBuf>,
}

impl FileLoggingConfig {
    /// Diagnostic log file with a leading `~` expanded
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_home)
    }

    /// Audit log path with a leading `~` expanded
    pub fn audit_log_path(&self) -> Option<PathBuf> {
        self.audit_log.as_deref().map(expand_home)
    }
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults_disabled() {
        let config = FileLoggingConfig::default();
        assert!(config.file_path().is_none());
        assert!(config.audit_log_path().is_none());
    }

    #[test]
    fn test_relative_path_unchanged() {
        let config = FileLoggingConfig {
            file: None,
            audit_log: Some(PathBuf::from("logs/audit.jsonl")),
        };
        assert_eq!(
            config.audit_log_path(),
            Some(PathBuf::from("logs/audit.jsonl"))
        );
    }

    #[test]
    fn test_home_expanded() {
        let config = FileLoggingConfig {
            file: Some(PathBuf::from("~/tally.log")),
            audit_log: None,
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.file_path(), Some(home.join("tally.log")));
        }
    }
}
