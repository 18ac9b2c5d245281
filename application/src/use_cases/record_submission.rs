//! Record Submission use case
//!
//! Intake for one worker answer. The flat field map is validated by
//! unpacking it; a malformed answer is rejected on its own and never
//! reaches the store.

use crate::ports::task_store::{StoreError, TaskStore};
use crate::ports::verification_logger::{
    NoVerificationLogger, SUBMISSION_RECORDED, SUBMISSION_REJECTED, VerificationEvent,
    VerificationLogger,
};
use crate::use_cases::task_locks::TaskLocks;
use serde_json::json;
use std::sync::Arc;
use tally_domain::core::error::DomainError;
use tally_domain::submission::{FlatFields, unpack};
use tally_domain::task::{Submission, TaskId, TaskState};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while recording a submission
#[derive(Error, Debug)]
pub enum RecordSubmissionError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Task {0} is already verified")]
    TaskClosed(TaskId),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(#[source] DomainError),

    /// Domain rule broken by the stored task, not by the submission
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RecordSubmissionError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => RecordSubmissionError::TaskNotFound(id),
            other => RecordSubmissionError::Store(other),
        }
    }
}

/// Input for recording one submission
#[derive(Debug, Clone)]
pub struct RecordSubmissionInput {
    pub task_id: TaskId,
    pub fields: FlatFields,
    pub worker: Option<String>,
}

impl RecordSubmissionInput {
    pub fn new(task_id: TaskId, fields: FlatFields) -> Self {
        Self {
            task_id,
            fields,
            worker: None,
        }
    }

    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = Some(worker.into());
        self
    }
}

/// Use case for accepting a worker's raw answer
pub struct RecordSubmissionUseCase {
    store: Arc<dyn TaskStore>,
    locks: TaskLocks,
    logger: Arc<dyn VerificationLogger>,
}

impl RecordSubmissionUseCase {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            locks: TaskLocks::new(),
            logger: Arc::new(NoVerificationLogger),
        }
    }

    /// Share a lock table with the verification use case
    pub fn with_locks(mut self, locks: TaskLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn VerificationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub async fn execute(
        &self,
        input: RecordSubmissionInput,
    ) -> Result<Submission, RecordSubmissionError> {
        let task_id = input.task_id;

        if let Err(e) = unpack(&input.fields) {
            warn!(task_id = %task_id, error = %e, "Rejecting malformed submission");
            self.logger.log(VerificationEvent::new(
                SUBMISSION_REJECTED,
                task_id,
                json!({"error": e.to_string()}),
            ));
            return Err(RecordSubmissionError::InvalidSubmission(e));
        }

        let _guard = self.locks.acquire(task_id).await;

        let mut task = self.store.load_task(task_id).await?;
        if !task.state.is_open() {
            return Err(RecordSubmissionError::TaskClosed(task_id));
        }

        let submission = self
            .store
            .add_submission(task_id, input.fields, input.worker)
            .await?;

        if task.state == TaskState::Created {
            task.transition_to(TaskState::AwaitingSubmissions)?;
            self.store.set_state(task_id, task.state).await?;
        }

        debug!(
            task_id = %task_id,
            sequence = submission.sequence,
            fields = submission.fields.len(),
            "Submission recorded"
        );
        self.logger.log(VerificationEvent::new(
            SUBMISSION_RECORDED,
            task_id,
            json!({
                "sequence": submission.sequence,
                "worker": submission.worker,
            }),
        ));

        Ok(submission)
    }
}
