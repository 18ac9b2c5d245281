//! Batch verification: load tasks and answers from a file, then run the
//! full lifecycle against the in-memory store.
//!
//! ```json
//! {
//!   "documents": ["https://example.org/report.pdf"],
//!   "task_types": { "find_table": { "initial": true } },
//!   "tasks": [
//!     {
//!       "type": "find_table",
//!       "params": {"url": "https://example.org/report.pdf"},
//!       "submissions": [
//!         {"page": "3", "tags[]": ["a", "b"]},
//!         {"page": "3", "tags[]": ["b", "a"]}
//!       ]
//!     }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tally_application::{
    CreateTasksUseCase, HandleNotificationUseCase, NoVerificationLogger, RecordSubmissionInput,
    RecordSubmissionUseCase, TaskLocks, VerificationLogger, VerificationOutcome,
    VerifyTaskUseCase,
};
use tally_domain::submission::FlatFields;
use tally_domain::task::{Task, TaskId, TaskSpec};
use tally_infrastructure::{FileConfig, FileTaskTypeConfig, InMemoryTaskStore, JsonlVerificationLogger};
use tracing::{info, warn};

/// Contents of a batch file
#[derive(Debug, Deserialize)]
pub struct Batch {
    /// Documents to seed initial tasks for
    #[serde(default)]
    pub documents: Vec<String>,
    /// Extra task types, merged over the configured ones
    #[serde(default)]
    pub task_types: BTreeMap<String, FileTaskTypeConfig>,
    #[serde(default)]
    pub tasks: Vec<BatchTask>,
}

#[derive(Debug, Deserialize)]
pub struct BatchTask {
    #[serde(flatten)]
    pub spec: TaskSpec,
    #[serde(default)]
    pub submissions: Vec<FlatFields>,
}

impl Batch {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse batch file {}", path.display()))
    }

    /// Move the batch's task types into `config`, replacing same-named ones
    pub fn merge_task_types(&mut self, config: &mut FileConfig) {
        config.task_types.append(&mut self.task_types);
    }
}

/// What happened to one task of the batch
#[derive(Debug, Serialize)]
pub struct TaskReport {
    pub task_id: Option<TaskId>,
    #[serde(rename = "type")]
    pub task_type: String,
    /// Submissions refused at intake
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_submissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VerificationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Outcome of repeating the verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<String>,
}

impl TaskReport {
    fn new(task_type: &str) -> Self {
        Self {
            task_id: None,
            task_type: task_type.to_string(),
            rejected_submissions: Vec::new(),
            outcome: None,
            error: None,
            replay: None,
        }
    }
}

/// Result of a whole batch run
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// Initial tasks created for `documents`
    pub seeded: Vec<Task>,
    pub tasks: Vec<TaskReport>,
}

/// Wire every layer together and run the batch
///
/// Batch task types must already be merged into `config` and validated.
pub async fn run(config: FileConfig, batch: Batch) -> Result<BatchReport> {
    let verifiers = Arc::new(config.build_verifiers());
    let task_types = Arc::new(config.build_task_types()?);
    let store = Arc::new(InMemoryTaskStore::new());
    let logger: Arc<dyn VerificationLogger> = match config
        .logging
        .audit_log_path()
        .and_then(JsonlVerificationLogger::new)
    {
        Some(logger) => {
            info!(path = %logger.path().display(), "Writing verification audit log");
            Arc::new(logger)
        }
        None => Arc::new(NoVerificationLogger),
    };
    let locks = TaskLocks::new();

    let verify = Arc::new(
        VerifyTaskUseCase::new(store.clone(), task_types.clone(), verifiers)
            .with_params(config.verification.to_params())
            .with_locks(locks.clone())
            .with_logger(logger.clone()),
    );
    let record = RecordSubmissionUseCase::new(store.clone())
        .with_locks(locks)
        .with_logger(logger);
    let create = CreateTasksUseCase::new(store.clone(), task_types);
    let notify = HandleNotificationUseCase::new(verify);

    let mut seeded = Vec::new();
    for url in &batch.documents {
        seeded.extend(create.for_document(url).await?);
    }

    let mut reports = Vec::with_capacity(batch.tasks.len());
    for entry in batch.tasks {
        let mut report = TaskReport::new(&entry.spec.task_type);
        match create.create(entry.spec).await {
            Ok(task) => {
                report.task_id = Some(task.id);
                for fields in entry.submissions {
                    if let Err(e) = record
                        .execute(RecordSubmissionInput::new(task.id, fields))
                        .await
                    {
                        report.rejected_submissions.push(e.to_string());
                    }
                }
            }
            Err(e) => {
                warn!(task_type = %report.task_type, error = %e, "Task not created");
                report.error = Some(e.to_string());
            }
        }
        reports.push(report);
    }

    let ids: Vec<TaskId> = reports.iter().filter_map(|r| r.task_id).collect();

    for (id, result) in ids.iter().zip(notify_all(&notify, &ids).await) {
        if let Some(report) = reports.iter_mut().find(|r| r.task_id == Some(*id)) {
            match result {
                Ok(outcome) => report.outcome = Some(outcome),
                Err(e) => report.error = Some(e.to_string()),
            }
        }
    }

    // A second round must not change anything that was verified
    for (id, result) in ids.iter().zip(notify_all(&notify, &ids).await) {
        if let Some(report) = reports.iter_mut().find(|r| r.task_id == Some(*id)) {
            report.replay = Some(match result {
                Ok(outcome) => outcome.label().to_string(),
                Err(e) => format!("error: {}", e),
            });
        }
    }

    Ok(BatchReport {
        seeded,
        tasks: reports,
    })
}

/// Notify completion of every task concurrently
async fn notify_all(
    notify: &HandleNotificationUseCase,
    ids: &[TaskId],
) -> Vec<Result<VerificationOutcome, tally_application::NotificationError>> {
    join_all(ids.iter().map(|id| {
        let payload = json!({"event": "task_completed", "task_id": id.value()}).to_string();
        async move { notify.execute(&payload).await }
    }))
    .await
}
