//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod logging;
mod task_types;
mod verification;

pub use logging::FileLoggingConfig;
pub use task_types::FileTaskTypeConfig;
pub use verification::FileVerificationConfig;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_domain::task::TaskTypeRegistry;
use tally_domain::verification::VerifierRegistry;
use tally_domain::verification::builtin::MAJORITY;
use tally_domain::{ConfigIssue, ConfigIssueCode, DomainError};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Thresholds and commit timeout
    pub verification: FileVerificationConfig,
    /// Diagnostic and audit log destinations
    pub logging: FileLoggingConfig,
    /// Declarative task types keyed by type name
    pub task_types: BTreeMap<String, FileTaskTypeConfig>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// It checks:
    /// 1. `[verification]` ranges and the majority rule
    /// 2. Field kinds that no verifier is registered under
    /// 3. Follow-on types that are not configured
    /// 4. Task types asking for fewer submissions than are ever compared
    /// 5. Partial confidence thresholds that no verifier can produce
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.verification.validate();
        let verifiers = self.build_verifiers();

        for (name, task_type) in &self.task_types {
            for (path, kind) in &task_type.fields {
                if !verifiers.contains(kind) {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::UnknownVerifierKind,
                        format!(
                            "task_types.{}.fields.\"{}\": unknown verifier kind '{}' (known: {})",
                            name,
                            path,
                            kind,
                            verifiers.kinds().join(", ")
                        ),
                    ));
                }
            }

            for follow_on in &task_type.follow_on {
                if !self.task_types.contains_key(follow_on) {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::UnknownFollowOnType,
                        format!(
                            "task_types.{}.follow_on: '{}' is not a configured task type",
                            name, follow_on
                        ),
                    ));
                }
            }

            if let Some(n) = task_type.required_submissions
                && n < self.verification.min_submissions
            {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::RequiredBelowMinimum,
                    format!(
                        "task_types.{}.required_submissions: {} is below verification.min_submissions ({}); the minimum applies",
                        name, n, self.verification.min_submissions
                    ),
                ));
            }
        }

        let uses_majority = self
            .task_types
            .values()
            .any(|t| t.fields.values().any(|kind| kind == MAJORITY));
        if self.verification.min_confidence < 1.0 && !uses_majority {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::PartialConfidenceWithoutMajority,
                format!(
                    "verification.min_confidence = {} has no effect: no field uses the '{}' verifier",
                    self.verification.min_confidence, MAJORITY
                ),
            ));
        }

        issues
    }

    /// Verifier registry with the built-in kinds and the configured majority rule
    pub fn build_verifiers(&self) -> VerifierRegistry {
        VerifierRegistry::with_builtins()
            .with_majority_rule(self.verification.parse_majority_rule().0)
    }

    /// Task type registry holding every configured type
    pub fn build_task_types(&self) -> Result<TaskTypeRegistry, DomainError> {
        let mut registry = TaskTypeRegistry::new();
        for (name, task_type) in &self.task_types {
            registry.register(task_type.to_task_type(name))?;
        }
        Ok(registry)
    }
}
