//! Consensus Engine
//!
//! Cross-checks N submissions of the same task. The engine is a pure
//! function: submissions in, [`ConsensusReport`] out. It never touches
//! persisted state.
//!
//! ```text
//! submissions ──► fewer than min_required? ──yes──► Insufficient (confidence 0)
//!                        │ no
//!                        ▼
//!             root verifier (declared kind at "" or by shape)
//!                        │
//!                        ▼
//!          (resolved value, confidence) ──► outcome vs. threshold
//! ```

use super::registry::VerifierRegistry;
use super::verifier::{FieldKinds, VerificationScope};
use crate::core::error::DomainError;
use crate::value::ValueTree;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Confidence required to accept a result
///
/// The default verifiers are unanimous-or-nothing, so anything below 1.0
/// only matters for partial-credit verifiers such as `majority`.
pub const MIN_CONFIDENCE: f64 = 1.0;

/// Fewest submissions that are ever compared
pub const MIN_SUBMISSIONS: usize = 2;

/// Outcome of a cross-check measured against a confidence threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusOutcome {
    /// Submissions agree with enough confidence
    Agreed,
    /// Submissions were compared but do not agree enough
    Disagreed,
    /// Not enough submissions to compare yet
    Insufficient,
}

impl std::fmt::Display for ConsensusOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusOutcome::Agreed => write!(f, "Agreed"),
            ConsensusOutcome::Disagreed => write!(f, "Disagreed"),
            ConsensusOutcome::Insufficient => write!(f, "Insufficient"),
        }
    }
}

/// Result of cross-checking a task's submissions
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusReport {
    /// Agreed value tree, `None` without consensus
    pub resolved: Option<ValueTree>,
    /// Overall confidence in `[0, 1]`
    pub confidence: f64,
    /// Number of submissions compared
    pub compared: usize,
    /// Kind of the root verifier, `None` when nothing was compared
    pub verifier: Option<String>,
}

impl ConsensusReport {
    fn insufficient(compared: usize) -> Self {
        Self {
            resolved: None,
            confidence: 0.0,
            compared,
            verifier: None,
        }
    }

    /// Whether the comparison was skipped for lack of submissions
    pub fn is_insufficient(&self) -> bool {
        self.verifier.is_none()
    }

    /// Classify this report against a confidence threshold
    pub fn outcome(&self, min_confidence: f64) -> ConsensusOutcome {
        if self.is_insufficient() {
            ConsensusOutcome::Insufficient
        } else if self.resolved.is_some() && self.confidence >= min_confidence {
            ConsensusOutcome::Agreed
        } else {
            ConsensusOutcome::Disagreed
        }
    }
}

/// Compares submissions field by field through the verifier registry
///
/// # Example
///
/// ```
/// use tally_domain::verification::{ConsensusEngine, FieldKinds, VerifierRegistry};
/// use tally_domain::value::ValueTree;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let engine = ConsensusEngine::new(Arc::new(VerifierRegistry::with_builtins()));
/// let submissions = vec![
///     ValueTree::from(json!({"name": "A", "tags": ["x", "y"]})),
///     ValueTree::from(json!({"name": "A", "tags": ["y", "x"]})),
/// ];
///
/// let report = engine.cross_check(&FieldKinds::new(), &submissions).unwrap();
/// assert_eq!(report.confidence, 1.0);
/// assert_eq!(report.resolved.unwrap().to_json(), json!({"name": "A", "tags": ["x", "y"]}));
/// ```
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    registry: Arc<VerifierRegistry>,
    min_required: usize,
}

impl ConsensusEngine {
    pub fn new(registry: Arc<VerifierRegistry>) -> Self {
        Self {
            registry,
            min_required: MIN_SUBMISSIONS,
        }
    }

    /// Require more submissions before comparing; never fewer than two
    pub fn with_min_required(mut self, min_required: usize) -> Self {
        self.min_required = min_required.max(MIN_SUBMISSIONS);
        self
    }

    pub fn min_required(&self) -> usize {
        self.min_required
    }

    pub fn registry(&self) -> &VerifierRegistry {
        &self.registry
    }

    /// Cross-check all submissions of a task
    ///
    /// Every submission takes part in the comparison, not just the first
    /// two. Disagreement is deterministic: no submission is privileged.
    pub fn cross_check(
        &self,
        field_kinds: &FieldKinds,
        submissions: &[ValueTree],
    ) -> Result<ConsensusReport, DomainError> {
        if submissions.len() < self.min_required {
            return Ok(ConsensusReport::insufficient(submissions.len()));
        }

        let scope = VerificationScope::root(&self.registry, field_kinds);
        let verifier = scope.resolve(&submissions[0])?;
        let refs: Vec<&ValueTree> = submissions.iter().collect();
        let verdict = verifier.verify(&refs, &scope)?;

        let confidence = if verdict.value.is_some() {
            verdict.confidence
        } else {
            0.0
        };

        Ok(ConsensusReport {
            resolved: verdict.value,
            confidence,
            compared: submissions.len(),
            verifier: Some(verifier.kind().to_string()),
        })
    }
}
