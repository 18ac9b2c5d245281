//! Port for structured verification logging.
//!
//! Defines the [`VerificationLogger`] trait for recording the audit trail of
//! the task lifecycle (submissions accepted or rejected, verification
//! attempts and their outcomes) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures every
//! verification decision in a machine-readable format (JSONL).

use serde_json::Value;
use tally_domain::task::TaskId;

pub const SUBMISSION_RECORDED: &str = "submission_recorded";
pub const SUBMISSION_REJECTED: &str = "submission_rejected";
pub const VERIFICATION_SKIPPED: &str = "verification_skipped";
pub const VERIFICATION_INSUFFICIENT: &str = "verification_insufficient";
pub const VERIFICATION_REJECTED: &str = "verification_rejected";
pub const TASK_VERIFIED: &str = "task_verified";
pub const VERIFICATION_FAILED: &str = "verification_failed";

/// A structured verification event.
pub struct VerificationEvent {
    /// Event type identifier (e.g., "task_verified").
    pub event_type: &'static str,
    /// Task the event is about.
    pub task_id: TaskId,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl VerificationEvent {
    pub fn new(event_type: &'static str, task_id: TaskId, payload: Value) -> Self {
        Self {
            event_type,
            task_id,
            payload,
        }
    }
}

/// Port for logging verification events to a structured log.
///
/// The `log` method is synchronous and non-fallible; logging failures
/// never disturb the lifecycle.
pub trait VerificationLogger: Send + Sync {
    /// Record a verification event.
    fn log(&self, event: VerificationEvent);
}

/// No-op implementation for tests and when the audit log is disabled.
pub struct NoVerificationLogger;

impl VerificationLogger for NoVerificationLogger {
    fn log(&self, _event: VerificationEvent) {}
}
