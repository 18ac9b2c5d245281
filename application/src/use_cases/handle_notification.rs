//! Handle Notification use case
//!
//! The task distribution service calls back when a task has collected
//! enough answers:
//!
//! ```json
//! {"event": "task_completed", "project_id": 1, "task_id": 17, "result_id": 4}
//! ```
//!
//! A valid notification triggers one verification attempt.

use crate::use_cases::verify_task::{VerificationOutcome, VerifyTaskError, VerifyTaskUseCase};
use serde_json::Value;
use std::sync::Arc;
use tally_domain::task::TaskId;
use thiserror::Error;
use tracing::info;

/// Event name sent when a task has collected its answers
pub const TASK_COMPLETED: &str = "task_completed";

/// Errors that can occur while handling a notification
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Invalid notification payload: {0}")]
    InvalidPayload(String),

    #[error("Unsupported notification event: {0}")]
    UnsupportedEvent(String),

    #[error("Notification is missing task_id")]
    MissingTaskId,

    #[error(transparent)]
    Verify(#[from] VerifyTaskError),
}

/// A parsed `task_completed` notification
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNotification {
    pub task_id: TaskId,
    pub project_id: Option<Value>,
}

impl TaskNotification {
    /// Parse a raw webhook body
    pub fn parse(payload: &str) -> Result<Self, NotificationError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| NotificationError::InvalidPayload(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| NotificationError::InvalidPayload("expected a JSON object".into()))?;

        let event = object
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| NotificationError::InvalidPayload("missing event".into()))?;
        if event != TASK_COMPLETED {
            return Err(NotificationError::UnsupportedEvent(event.to_string()));
        }

        let task_id = match object.get("task_id") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .ok_or(NotificationError::MissingTaskId)?;

        Ok(Self {
            task_id: TaskId::new(task_id),
            project_id: object.get("project_id").filter(|v| !v.is_null()).cloned(),
        })
    }
}

/// Use case for turning a completion notification into a verification attempt
pub struct HandleNotificationUseCase {
    verify: Arc<VerifyTaskUseCase>,
}

impl HandleNotificationUseCase {
    pub fn new(verify: Arc<VerifyTaskUseCase>) -> Self {
        Self { verify }
    }

    pub async fn execute(&self, payload: &str) -> Result<VerificationOutcome, NotificationError> {
        let notification = TaskNotification::parse(payload)?;
        info!(
            task_id = %notification.task_id,
            project_id = ?notification.project_id,
            "Task completion notified"
        );
        Ok(self.verify.execute(notification.task_id).await?)
    }
}
