//! Verification configuration from TOML (`[verification]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [verification]
//! min_confidence = 1.0        # only unanimous answers commit
//! min_submissions = 2
//! commit_timeout_secs = 10
//! majority_rule = "majority"  # or "unanimous", "atleast:2", "75%"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tally_application::VerificationParams;
use tally_domain::verification::{MIN_CONFIDENCE, MIN_SUBMISSIONS};
use tally_domain::{ConfigIssue, ConfigIssueCode, QuorumRule};

/// Verification lifecycle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVerificationConfig {
    /// Confidence a cross-check must reach to commit
    pub min_confidence: f64,
    /// Fewest submissions ever compared
    pub min_submissions: usize,
    /// Upper bound on committing a verified result
    pub commit_timeout_secs: u64,
    /// Rule used by the `majority` verifier: "majority", "unanimous", "atleast:N", "N%"
    pub majority_rule: String,
}

impl Default for FileVerificationConfig {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE,
            min_submissions: MIN_SUBMISSIONS,
            commit_timeout_secs: 10,
            majority_rule: "majority".to_string(),
        }
    }
}

impl FileVerificationConfig {
    /// Parse the majority rule, falling back to the default on error
    pub fn parse_majority_rule(&self) -> (QuorumRule, Vec<ConfigIssue>) {
        match self.majority_rule.parse::<QuorumRule>() {
            Ok(rule) => (rule, Vec::new()),
            Err(e) => (
                QuorumRule::default(),
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidMajorityRule,
                    format!("verification.majority_rule: {}", e),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_majority_rule().1;

        if !(0.0..=1.0).contains(&self.min_confidence) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ConfidenceOutOfRange,
                format!(
                    "verification.min_confidence: {} is outside [0, 1]",
                    self.min_confidence
                ),
            ));
        }
        if self.min_submissions < MIN_SUBMISSIONS {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::TooFewSubmissions,
                format!(
                    "verification.min_submissions: {} is below {}; nothing can be compared",
                    self.min_submissions, MIN_SUBMISSIONS
                ),
            ));
        }
        if self.commit_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroCommitTimeout,
                "verification.commit_timeout_secs: must be greater than zero",
            ));
        }

        issues
    }

    pub fn to_params(&self) -> VerificationParams {
        VerificationParams::default()
            .with_min_confidence(self.min_confidence)
            .with_min_submissions(self.min_submissions)
            .with_commit_timeout(Duration::from_secs(self.commit_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_config_default() {
        let config = FileVerificationConfig::default();
        assert_eq!(config.min_confidence, 1.0);
        assert_eq!(config.min_submissions, 2);
        assert_eq!(config.commit_timeout_secs, 10);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_majority_rule() {
        let mut config = FileVerificationConfig::default();

        config.majority_rule = "unanimous".to_string();
        assert_eq!(config.parse_majority_rule().0, QuorumRule::Unanimous);

        config.majority_rule = "atleast:3".to_string();
        assert_eq!(config.parse_majority_rule().0, QuorumRule::AtLeast(3));

        config.majority_rule = "most".to_string();
        let (rule, issues) = config.parse_majority_rule();
        assert_eq!(rule, QuorumRule::Majority);
        assert_eq!(issues[0].code, ConfigIssueCode::InvalidMajorityRule);
    }

    #[test]
    fn test_validate_out_of_range() {
        let config = FileVerificationConfig {
            min_confidence: 1.5,
            min_submissions: 1,
            commit_timeout_secs: 0,
            ..Default::default()
        };
        let codes: Vec<_> = config.validate().iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                ConfigIssueCode::ConfidenceOutOfRange,
                ConfigIssueCode::TooFewSubmissions,
                ConfigIssueCode::ZeroCommitTimeout,
            ]
        );
    }

    #[test]
    fn test_to_params() {
        let config = FileVerificationConfig {
            min_confidence: 0.6,
            min_submissions: 3,
            commit_timeout_secs: 2,
            ..Default::default()
        };
        let params = config.to_params();
        assert_eq!(params.min_confidence, 0.6);
        assert_eq!(params.min_submissions, 3);
        assert_eq!(params.commit_timeout, Duration::from_secs(2));
    }
}
