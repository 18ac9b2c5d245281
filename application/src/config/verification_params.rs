//! Verification parameters - lifecycle control.
//!
//! [`VerificationParams`] groups the static parameters that control
//! [`VerifyTaskUseCase`](crate::use_cases::verify_task::VerifyTaskUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tally_domain::verification::{MIN_CONFIDENCE, MIN_SUBMISSIONS};

/// Verification lifecycle parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationParams {
    /// Confidence a cross-check must reach to commit a result.
    pub min_confidence: f64,
    /// Fewest submissions ever compared, whatever a task asks for.
    pub min_submissions: usize,
    /// Upper bound on the commit of a verified result.
    pub commit_timeout: Duration,
}

impl Default for VerificationParams {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE,
            min_submissions: MIN_SUBMISSIONS,
            commit_timeout: Duration::from_secs(10),
        }
    }
}

impl VerificationParams {
    // ==================== Builder Methods ====================

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_submissions(mut self, min_submissions: usize) -> Self {
        self.min_submissions = min_submissions.max(MIN_SUBMISSIONS);
        self
    }

    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }
}
