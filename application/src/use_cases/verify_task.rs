//! Verify Task use case
//!
//! Drives one verification attempt for a task:
//!
//! ```text
//! lock(task) ─► load ─► already verified? ──yes──► AlreadyVerified
//!                          │ no
//!                          ▼
//!        unpack submissions (skip malformed) ─► enough? ──no──► Insufficient
//!                          │ yes
//!                          ▼
//!                ConsensusEngine::cross_check
//!                 │                      │
//!              agreed                disagreed ─► RejectedPending
//!                 ▼
//!   begin ─► result ─► save hook ─► follow-on hook ─► Verified ─► commit
//!                 (any failure rolls the whole unit back)
//! ```
//!
//! Attempts on the same task are serialized through [`TaskLocks`]; a
//! repeated attempt on a verified task is a no-op.

use crate::config::VerificationParams;
use crate::ports::task_store::{StoreError, TaskStore, TaskTransaction};
use crate::ports::verification_logger::{
    NoVerificationLogger, TASK_VERIFIED, VERIFICATION_FAILED, VERIFICATION_INSUFFICIENT,
    VERIFICATION_REJECTED, VERIFICATION_SKIPPED, VerificationEvent, VerificationLogger,
};
use crate::use_cases::task_locks::TaskLocks;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tally_domain::core::error::DomainError;
use tally_domain::submission::unpack;
use tally_domain::task::{
    HookError, Task, TaskBehavior, TaskId, TaskState, TaskTypeRegistry, VerifiedRecords,
    VerifiedResult,
};
use tally_domain::value::ValueTree;
use tally_domain::verification::{ConsensusEngine, ConsensusOutcome, VerifierRegistry};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while verifying a task
#[derive(Error, Debug)]
pub enum VerifyTaskError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence failure: {0}")]
    Store(StoreError),

    #[error("Commit timed out after {0:?}")]
    CommitTimeout(Duration),

    #[error("Save hook failed for task {task_id}: {source}")]
    SaveHook {
        task_id: TaskId,
        #[source]
        source: HookError,
    },

    #[error("Follow-on hook failed for task {task_id}: {source}")]
    FollowOnHook {
        task_id: TaskId,
        #[source]
        source: HookError,
    },
}

impl From<StoreError> for VerifyTaskError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => VerifyTaskError::TaskNotFound(id),
            other => VerifyTaskError::Store(other),
        }
    }
}

impl VerifyTaskError {
    /// Whether a later attempt may succeed without changing configuration
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VerifyTaskError::Store(_)
                | VerifyTaskError::CommitTimeout(_)
                | VerifyTaskError::SaveHook { .. }
                | VerifyTaskError::FollowOnHook { .. }
        )
    }

    fn label(&self) -> &'static str {
        match self {
            VerifyTaskError::TaskNotFound(_) => "task_not_found",
            VerifyTaskError::Domain(_) => "configuration",
            VerifyTaskError::Store(_) => "store",
            VerifyTaskError::CommitTimeout(_) => "commit_timeout",
            VerifyTaskError::SaveHook { .. } => "save_hook",
            VerifyTaskError::FollowOnHook { .. } => "follow_on_hook",
        }
    }
}

/// Result of one verification attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Consensus reached and committed, with the follow-on tasks created
    Verified {
        result: VerifiedResult,
        follow_on: Vec<Task>,
    },
    /// Submissions compared but disagreed; the task stays open
    Rejected { confidence: f64, compared: usize },
    /// Not enough valid submissions yet
    Insufficient { have: usize, need: usize },
    /// Task was verified by an earlier attempt; nothing changed
    AlreadyVerified { result: Option<VerifiedResult> },
}

impl VerificationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Verified { .. } => "verified",
            VerificationOutcome::Rejected { .. } => "rejected",
            VerificationOutcome::Insufficient { .. } => "insufficient",
            VerificationOutcome::AlreadyVerified { .. } => "already_verified",
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified { .. })
    }
}

/// Use case for verifying a task's submissions and committing the result
pub struct VerifyTaskUseCase {
    store: Arc<dyn TaskStore>,
    task_types: Arc<TaskTypeRegistry>,
    engine: ConsensusEngine,
    params: VerificationParams,
    locks: TaskLocks,
    logger: Arc<dyn VerificationLogger>,
}

impl VerifyTaskUseCase {
    pub fn new(
        store: Arc<dyn TaskStore>,
        task_types: Arc<TaskTypeRegistry>,
        verifiers: Arc<VerifierRegistry>,
    ) -> Self {
        let params = VerificationParams::default();
        Self {
            store,
            task_types,
            engine: ConsensusEngine::new(verifiers).with_min_required(params.min_submissions),
            params,
            locks: TaskLocks::new(),
            logger: Arc::new(NoVerificationLogger),
        }
    }

    pub fn with_params(mut self, params: VerificationParams) -> Self {
        self.engine = self.engine.with_min_required(params.min_submissions);
        self.params = params;
        self
    }

    /// Share a lock table with other use cases touching the same tasks
    pub fn with_locks(mut self, locks: TaskLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn VerificationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn locks(&self) -> &TaskLocks {
        &self.locks
    }

    pub async fn execute(&self, task_id: TaskId) -> Result<VerificationOutcome, VerifyTaskError> {
        let _guard = self.locks.acquire(task_id).await;

        match self.verify_locked(task_id).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Verification failed");
                self.logger.log(VerificationEvent::new(
                    VERIFICATION_FAILED,
                    task_id,
                    json!({
                        "error": e.to_string(),
                        "kind": e.label(),
                        "retryable": e.is_retryable(),
                    }),
                ));
                Err(e)
            }
        }
    }

    async fn verify_locked(&self, task_id: TaskId) -> Result<VerificationOutcome, VerifyTaskError> {
        let mut task = self.store.load_task(task_id).await?;

        if task.is_verified() {
            debug!(task_id = %task_id, "Task already verified, skipping");
            self.logger.log(VerificationEvent::new(
                VERIFICATION_SKIPPED,
                task_id,
                json!({"reason": "already_verified"}),
            ));
            let result = self.store.verified_result(task_id).await?;
            return Ok(VerificationOutcome::AlreadyVerified { result });
        }

        let behavior = self.task_types.resolve(&task.task_type)?;
        let submissions = self.store.load_submissions(task_id).await?;

        let mut trees = Vec::with_capacity(submissions.len());
        for submission in &submissions {
            match unpack(&submission.fields) {
                Ok(tree) => trees.push(tree),
                Err(e) => warn!(
                    task_id = %task_id,
                    sequence = submission.sequence,
                    error = %e,
                    "Skipping malformed submission"
                ),
            }
        }

        if task.state == TaskState::Created && !submissions.is_empty() {
            task.transition_to(TaskState::AwaitingSubmissions)?;
            self.store.set_state(task_id, task.state).await?;
        }

        let need = task.required_submissions.max(self.engine.min_required());
        if trees.len() < need {
            return Ok(self.insufficient(task_id, trees.len(), need));
        }

        let report = self.engine.cross_check(&behavior.field_kinds(), &trees)?;
        debug!(
            task_id = %task_id,
            confidence = report.confidence,
            compared = report.compared,
            "Cross-check complete"
        );

        match (report.outcome(self.params.min_confidence), report.resolved) {
            (ConsensusOutcome::Agreed, Some(value)) => {
                self.commit_verified(task, behavior.as_ref(), value, report.confidence, report.compared)
                    .await
            }
            (ConsensusOutcome::Insufficient, _) => {
                Ok(self.insufficient(task_id, report.compared, need))
            }
            _ => {
                task.transition_to(TaskState::RejectedPending)?;
                self.store.set_state(task_id, task.state).await?;

                info!(
                    task_id = %task_id,
                    task_type = %task.task_type,
                    confidence = report.confidence,
                    "Submissions disagree, task stays open"
                );
                self.logger.log(VerificationEvent::new(
                    VERIFICATION_REJECTED,
                    task_id,
                    json!({
                        "confidence": report.confidence,
                        "compared": report.compared,
                        "min_confidence": self.params.min_confidence,
                    }),
                ));
                Ok(VerificationOutcome::Rejected {
                    confidence: report.confidence,
                    compared: report.compared,
                })
            }
        }
    }

    fn insufficient(&self, task_id: TaskId, have: usize, need: usize) -> VerificationOutcome {
        debug!(task_id = %task_id, have, need, "Not enough submissions to verify");
        self.logger.log(VerificationEvent::new(
            VERIFICATION_INSUFFICIENT,
            task_id,
            json!({"have": have, "need": need}),
        ));
        VerificationOutcome::Insufficient { have, need }
    }

    async fn commit_verified(
        &self,
        task: Task,
        behavior: &dyn TaskBehavior,
        value: ValueTree,
        confidence: f64,
        compared: usize,
    ) -> Result<VerificationOutcome, VerifyTaskError> {
        let result = VerifiedResult::new(task.id, value, confidence, compared);

        let mut tx = self.store.begin().await?;
        let follow_on = match self.stage(tx.as_mut(), &task, behavior, &result).await {
            Ok(follow_on) => follow_on,
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(task_id = %task.id, error = %rollback_error, "Rollback failed");
                }
                return Err(e);
            }
        };

        match tokio::time::timeout(self.params.commit_timeout, tx.commit()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(VerifyTaskError::CommitTimeout(self.params.commit_timeout)),
        }

        info!(
            task_id = %task.id,
            task_type = %task.task_type,
            confidence,
            follow_on = follow_on.len(),
            "Task verified"
        );
        self.logger.log(VerificationEvent::new(
            TASK_VERIFIED,
            task.id,
            json!({
                "task_type": task.task_type,
                "confidence": confidence,
                "compared": compared,
                "value": result.value.to_json(),
                "follow_on": follow_on.iter().map(|t| t.id.value()).collect::<Vec<_>>(),
            }),
        ));

        Ok(VerificationOutcome::Verified { result, follow_on })
    }

    /// Stage every write of a successful verification into `tx`
    async fn stage(
        &self,
        tx: &mut dyn TaskTransaction,
        task: &Task,
        behavior: &dyn TaskBehavior,
        result: &VerifiedResult,
    ) -> Result<Vec<Task>, VerifyTaskError> {
        tx.save_verified_result(result.clone()).await?;

        let mut records = VerifiedRecords::new();
        behavior
            .save_verified(task, &result.value, &mut records)
            .map_err(|source| VerifyTaskError::SaveHook {
                task_id: task.id,
                source,
            })?;
        tx.save_records(task.id, records).await?;

        let specs = behavior
            .follow_on(task, &result.value)
            .map_err(|source| VerifyTaskError::FollowOnHook {
                task_id: task.id,
                source,
            })?;
        let mut follow_on = Vec::with_capacity(specs.len());
        for spec in specs {
            // An unregistered child could never be verified
            self.task_types.resolve(&spec.task_type)?;
            let spec = self.task_types.complete_spec(spec);
            follow_on.push(tx.create_task(spec).await?);
        }

        let mut verified = task.clone();
        verified.transition_to(TaskState::Verified)?;
        tx.set_state(task.id, verified.state).await?;

        Ok(follow_on)
    }
}
