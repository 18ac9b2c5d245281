//! Task store port
//!
//! Persistence for tasks, raw submissions and verified results. Writes that
//! must land together (verified result, staged records, follow-on tasks and
//! the `Verified` state) go through a [`TaskTransaction`].

use async_trait::async_trait;
use tally_domain::submission::FlatFields;
use tally_domain::task::{
    Submission, Task, TaskId, TaskSpec, TaskState, VerifiedRecords, VerifiedResult,
};
use thiserror::Error;

/// Errors that can occur while talking to the task store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Persistence port for the task lifecycle
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a task in [`TaskState::Created`] with a fresh id
    async fn create_task(&self, spec: TaskSpec) -> Result<Task, StoreError>;

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError>;

    /// All raw submissions for a task, in arrival order
    async fn load_submissions(&self, id: TaskId) -> Result<Vec<Submission>, StoreError>;

    /// Append a raw submission
    async fn add_submission(
        &self,
        id: TaskId,
        fields: FlatFields,
        worker: Option<String>,
    ) -> Result<Submission, StoreError>;

    /// Overwrite a task's state outside of any transaction
    async fn set_state(&self, id: TaskId, state: TaskState) -> Result<(), StoreError>;

    async fn verified_result(&self, id: TaskId) -> Result<Option<VerifiedResult>, StoreError>;

    /// Start a unit of work
    async fn begin(&self) -> Result<Box<dyn TaskTransaction>, StoreError>;
}

/// A unit of work against the task store
///
/// Nothing written through a transaction is visible until [`commit`]
/// succeeds. Dropping a transaction without committing discards it.
///
/// [`commit`]: TaskTransaction::commit
#[async_trait]
pub trait TaskTransaction: Send {
    /// Stage the verified result; a task has at most one
    async fn save_verified_result(&mut self, result: VerifiedResult) -> Result<(), StoreError>;

    /// Stage records produced by a save hook
    async fn save_records(
        &mut self,
        task_id: TaskId,
        records: VerifiedRecords,
    ) -> Result<(), StoreError>;

    /// Stage a new task; its id is reserved immediately
    async fn create_task(&mut self, spec: TaskSpec) -> Result<Task, StoreError>;

    async fn set_state(&mut self, id: TaskId, state: TaskState) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
