//! Task entities and the task state machine
//!
//! ```text
//!            first submission
//! Created ─────────────────────► AwaitingSubmissions ◄──┐ not enough yet
//!                                   │        │          │
//!                       agreed      │        └──────────┘
//!                    ┌──────────────┘        │ disagreed
//!                    ▼                       ▼
//!                Verified ◄──────────── RejectedPending ◄─┐
//!               (terminal)    agreed         └────────────┘ still disagreed
//! ```

use crate::core::error::DomainError;
use crate::core::time::current_timestamp;
use crate::submission::FlatFields;
use crate::value::ValueTree;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Submissions a task asks for when its spec does not say
pub const DEFAULT_REQUIRED_SUBMISSIONS: usize = 1;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task exists, no submissions recorded
    #[default]
    Created,
    /// At least one submission, consensus not attempted or not reached
    AwaitingSubmissions,
    /// Consensus reached and committed
    Verified,
    /// Submissions compared but disagreed; still open for more
    RejectedPending,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Created => "created",
            TaskState::AwaitingSubmissions => "awaiting_submissions",
            TaskState::Verified => "verified",
            TaskState::RejectedPending => "rejected_pending",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Verified)
    }

    /// Whether the task still accepts submissions
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Created, AwaitingSubmissions)
                | (AwaitingSubmissions, AwaitingSubmissions)
                | (AwaitingSubmissions, Verified)
                | (AwaitingSubmissions, RejectedPending)
                | (RejectedPending, RejectedPending)
                | (RejectedPending, Verified)
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Specification for a task that does not exist yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Registered task type name
    #[serde(rename = "type")]
    pub task_type: String,
    /// Opaque parameters, e.g. a source document reference
    #[serde(default)]
    pub params: Value,
    /// Submissions to collect before verifying; the type's default when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_submissions: Option<usize>,
}

impl TaskSpec {
    pub fn new(task_type: impl Into<String>, params: Value) -> Self {
        Self {
            task_type: task_type.into(),
            params,
            required_submissions: None,
        }
    }

    pub fn with_required_submissions(mut self, n: usize) -> Self {
        self.required_submissions = Some(n);
        self
    }
}

/// A unit of crowdsourced work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub task_type: String,
    pub params: Value,
    pub required_submissions: usize,
    pub state: TaskState,
}

impl Task {
    /// New task in [`TaskState::Created`]
    pub fn from_spec(id: TaskId, spec: &TaskSpec) -> Self {
        Self {
            id,
            task_type: spec.task_type.clone(),
            params: spec.params.clone(),
            required_submissions: spec
                .required_submissions
                .unwrap_or(DEFAULT_REQUIRED_SUBMISSIONS),
            state: TaskState::Created,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.state == TaskState::Verified
    }

    /// Move to `next`, rejecting transitions the state machine forbids
    pub fn transition_to(&mut self, next: TaskState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// One worker's raw answer to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub task_id: TaskId,
    /// Arrival order within the store
    pub sequence: u64,
    pub fields: FlatFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
}

/// Accepted answer for a task, written once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedResult {
    pub task_id: TaskId,
    pub value: ValueTree,
    pub confidence: f64,
    /// Number of submissions that were compared
    pub submissions: usize,
    /// Milliseconds since epoch
    pub verified_at: u64,
}

impl VerifiedResult {
    pub fn new(task_id: TaskId, value: ValueTree, confidence: f64, submissions: usize) -> Self {
        Self {
            task_id,
            value,
            confidence,
            submissions,
            verified_at: current_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_from_spec_defaults() {
        let spec = TaskSpec::new("find_table", json!({"url": "https://bla.pl"}));
        let task = Task::from_spec(TaskId::new(7), &spec);
        assert_eq!(task.state, TaskState::Created);
        assert_eq!(task.required_submissions, DEFAULT_REQUIRED_SUBMISSIONS);
        assert_eq!(task.params["url"], "https://bla.pl");
    }

    #[test]
    fn test_spec_required_submissions() {
        let spec = TaskSpec::new("t", json!({})).with_required_submissions(3);
        assert_eq!(Task::from_spec(TaskId::new(1), &spec).required_submissions, 3);
    }

    #[test]
    fn test_valid_lifecycle() {
        let mut task = Task::from_spec(TaskId::new(1), &TaskSpec::new("t", json!({})));
        task.transition_to(TaskState::AwaitingSubmissions).unwrap();
        task.transition_to(TaskState::RejectedPending).unwrap();
        task.transition_to(TaskState::Verified).unwrap();
        assert!(task.is_verified());
    }

    #[test]
    fn test_verified_is_terminal() {
        let mut task = Task::from_spec(TaskId::new(1), &TaskSpec::new("t", json!({})));
        task.state = TaskState::Verified;
        let err = task.transition_to(TaskState::AwaitingSubmissions).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "verified".to_string(),
                to: "awaiting_submissions".to_string()
            }
        );
        assert!(!TaskState::Verified.can_transition_to(TaskState::Verified));
    }

    #[test]
    fn test_created_cannot_skip_to_verified() {
        assert!(!TaskState::Created.can_transition_to(TaskState::Verified));
        assert!(!TaskState::Created.can_transition_to(TaskState::RejectedPending));
    }

    #[test]
    fn test_spec_serde_uses_type_key() {
        let spec: TaskSpec =
            serde_json::from_str(r#"{"type": "find_table", "params": {"url": "u"}}"#).unwrap();
        assert_eq!(spec.task_type, "find_table");
        assert!(spec.required_submissions.is_none());
    }

    #[test]
    fn test_state_serde() {
        assert_eq!(
            serde_json::to_string(&TaskState::RejectedPending).unwrap(),
            r#""rejected_pending""#
        );
    }
}
