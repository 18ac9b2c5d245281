//! Configuration validation results
//!
//! Validators return a list of issues instead of failing on the first one,
//! so a single run reports everything wrong with a configuration file.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// `min_confidence` outside `[0, 1]`.
    ConfidenceOutOfRange,
    /// `min_confidence` below 1.0 with only unanimous verifiers in use.
    PartialConfidenceWithoutMajority,
    /// `min_submissions` below two; comparison needs at least two answers.
    TooFewSubmissions,
    /// `commit_timeout_secs` is zero.
    ZeroCommitTimeout,
    /// `majority_rule` does not parse.
    InvalidMajorityRule,
    /// A field declares a verifier kind nobody registered.
    UnknownVerifierKind,
    /// A follow-on names a task type that is not configured.
    UnknownFollowOnType,
    /// A task type asks for fewer submissions than can ever be compared.
    RequiredBelowMinimum,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_constructors() {
        let issue = ConfigIssue::error(ConfigIssueCode::TooFewSubmissions, "min_submissions = 1");
        assert!(issue.is_error());
        assert_eq!(issue.to_string(), "[error] min_submissions = 1");

        let issue = ConfigIssue::warning(ConfigIssueCode::RequiredBelowMinimum, "x");
        assert!(!issue.is_error());
        assert_eq!(issue.severity, Severity::Warning);
    }
}
