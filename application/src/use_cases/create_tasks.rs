//! Create Tasks use case
//!
//! Seeds the pipeline: every task type flagged as initial gets one task
//! per new document. Also creates individual tasks of a known type.

use crate::ports::task_store::{StoreError, TaskStore};
use serde_json::json;
use std::sync::Arc;
use tally_domain::core::error::DomainError;
use tally_domain::task::{Task, TaskSpec, TaskTypeRegistry};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while creating tasks
#[derive(Error, Debug)]
pub enum CreateTasksError {
    #[error("No initial task types are registered")]
    NoInitialTypes,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Persistence failure: {0}")]
    Store(#[from] StoreError),
}

/// Use case for creating tasks
pub struct CreateTasksUseCase {
    store: Arc<dyn TaskStore>,
    task_types: Arc<TaskTypeRegistry>,
}

impl CreateTasksUseCase {
    pub fn new(store: Arc<dyn TaskStore>, task_types: Arc<TaskTypeRegistry>) -> Self {
        Self { store, task_types }
    }

    /// Create one task per initial type for the document at `url`
    pub async fn for_document(&self, url: &str) -> Result<Vec<Task>, CreateTasksError> {
        let initial = self.task_types.initial_types();
        if initial.is_empty() {
            return Err(CreateTasksError::NoInitialTypes);
        }

        let mut created = Vec::with_capacity(initial.len());
        for behavior in initial {
            let spec = TaskSpec::new(behavior.type_name(), json!({ "url": url }))
                .with_required_submissions(behavior.required_submissions());
            let task = self.store.create_task(spec).await?;
            info!(task_id = %task.id, task_type = %task.task_type, url, "Initial task created");
            created.push(task);
        }
        Ok(created)
    }

    /// Create a single task of a registered type
    pub async fn create(&self, spec: TaskSpec) -> Result<Task, CreateTasksError> {
        self.task_types.resolve(&spec.task_type)?;
        let spec = self.task_types.complete_spec(spec);
        Ok(self.store.create_task(spec).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{MockTaskStore, spec, task_types};
    use tally_domain::task::{DeclarativeTaskType, TaskState};

    #[tokio::test]
    async fn test_initial_tasks_for_document() {
        let store = MockTaskStore::new();
        let use_case = CreateTasksUseCase::new(Arc::new(store.clone()), task_types());

        let created = use_case.for_document("https://bla.pl").await.unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].task_type, "find_table");
        assert_eq!(created[0].params, json!({"url": "https://bla.pl"}));
        assert_eq!(created[0].required_submissions, 2);
        assert_eq!(created[0].state, TaskState::Created);
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_no_initial_types() {
        let mut registry = TaskTypeRegistry::new();
        registry
            .register(DeclarativeTaskType::new("transcribe_table"))
            .unwrap();
        let use_case = CreateTasksUseCase::new(Arc::new(MockTaskStore::new()), Arc::new(registry));

        let err = use_case.for_document("u").await.unwrap_err();
        assert!(matches!(err, CreateTasksError::NoInitialTypes));
    }

    #[tokio::test]
    async fn test_create_fills_required_submissions() {
        let store = MockTaskStore::new();
        let use_case = CreateTasksUseCase::new(Arc::new(store), task_types());

        let task = use_case.create(spec("transcribe_table")).await.unwrap();
        assert_eq!(task.required_submissions, 3);
    }

    #[tokio::test]
    async fn test_create_unknown_type() {
        let use_case = CreateTasksUseCase::new(Arc::new(MockTaskStore::new()), task_types());
        let err = use_case.create(spec("mystery")).await.unwrap_err();
        assert!(matches!(
            err,
            CreateTasksError::Domain(DomainError::UnknownTaskType(_))
        ));
    }
}
