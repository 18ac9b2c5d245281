//! In-memory task store.
//!
//! Keeps every task, submission, verified result and staged record in a
//! single `Mutex`-guarded state. Transactions buffer their writes and apply
//! them in one critical section on commit, so readers never observe a
//! partially verified task.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tally_application::ports::task_store::{StoreError, TaskStore, TaskTransaction};
use tally_domain::submission::FlatFields;
use tally_domain::task::{
    Submission, Task, TaskId, TaskSpec, TaskState, VerifiedRecord, VerifiedRecords,
    VerifiedResult,
};
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    next_task_id: u64,
    next_sequence: u64,
    tasks: BTreeMap<TaskId, Task>,
    submissions: BTreeMap<TaskId, Vec<Submission>>,
    results: BTreeMap<TaskId, VerifiedResult>,
    records: Vec<(TaskId, VerifiedRecord)>,
}

impl State {
    fn reserve_task_id(&mut self) -> TaskId {
        self.next_task_id += 1;
        TaskId::new(self.next_task_id)
    }
}

/// Task store held entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<State>>,
    commit_latency: Option<Duration>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every commit, e.g. to exercise commit timeouts
    pub fn with_commit_latency(mut self, latency: Duration) -> Self {
        self.commit_latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All tasks ordered by id
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.values().cloned().collect()
    }

    /// Records staged by save hooks for one collection, in commit order
    pub fn records(&self, collection: &str) -> Vec<(TaskId, VerifiedRecord)> {
        self.lock()
            .records
            .iter()
            .filter(|(_, r)| r.collection == collection)
            .cloned()
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create_task(&self, spec: TaskSpec) -> Result<Task, StoreError> {
        let mut state = self.lock();
        let task = Task::from_spec(state.reserve_task_id(), &spec);
        state.tasks.insert(task.id, task.clone());
        debug!(task_id = %task.id, task_type = %task.task_type, "Task stored");
        Ok(task)
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError> {
        self.lock()
            .tasks
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn load_submissions(&self, id: TaskId) -> Result<Vec<Submission>, StoreError> {
        let state = self.lock();
        if !state.tasks.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        Ok(state.submissions.get(&id).cloned().unwrap_or_default())
    }

    async fn add_submission(
        &self,
        id: TaskId,
        fields: FlatFields,
        worker: Option<String>,
    ) -> Result<Submission, StoreError> {
        let mut state = self.lock();
        if !state.tasks.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        state.next_sequence += 1;
        let submission = Submission {
            task_id: id,
            sequence: state.next_sequence,
            fields,
            worker,
        };
        state
            .submissions
            .entry(id)
            .or_default()
            .push(submission.clone());
        Ok(submission)
    }

    async fn set_state(&self, id: TaskId, new_state: TaskState) -> Result<(), StoreError> {
        let mut state = self.lock();
        let task = state.tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        task.state = new_state;
        Ok(())
    }

    async fn verified_result(&self, id: TaskId) -> Result<Option<VerifiedResult>, StoreError> {
        Ok(self.lock().results.get(&id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn TaskTransaction>, StoreError> {
        Ok(Box::new(InMemoryTransaction {
            store: self.clone(),
            writes: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum Write {
    Result(VerifiedResult),
    Records(TaskId, VerifiedRecords),
    CreateTask(Task),
    SetState(TaskId, TaskState),
}

/// Buffered unit of work; dropped without commit, nothing happens
#[derive(Debug)]
pub struct InMemoryTransaction {
    store: InMemoryTaskStore,
    writes: Vec<Write>,
}

#[async_trait]
impl TaskTransaction for InMemoryTransaction {
    async fn save_verified_result(&mut self, result: VerifiedResult) -> Result<(), StoreError> {
        self.writes.push(Write::Result(result));
        Ok(())
    }

    async fn save_records(
        &mut self,
        task_id: TaskId,
        records: VerifiedRecords,
    ) -> Result<(), StoreError> {
        self.writes.push(Write::Records(task_id, records));
        Ok(())
    }

    async fn create_task(&mut self, spec: TaskSpec) -> Result<Task, StoreError> {
        let id = self.store.lock().reserve_task_id();
        let task = Task::from_spec(id, &spec);
        self.writes.push(Write::CreateTask(task.clone()));
        Ok(task)
    }

    async fn set_state(&mut self, id: TaskId, state: TaskState) -> Result<(), StoreError> {
        self.writes.push(Write::SetState(id, state));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction { store, writes } = *self;
        if let Some(latency) = store.commit_latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = store.lock();

        // Validate everything before touching state
        for write in &writes {
            match write {
                Write::Result(result) if state.results.contains_key(&result.task_id) => {
                    return Err(StoreError::Conflict(format!(
                        "task {} already has a verified result",
                        result.task_id
                    )));
                }
                Write::SetState(id, _) if !state.tasks.contains_key(id) => {
                    return Err(StoreError::NotFound(*id));
                }
                _ => {}
            }
        }

        let count = writes.len();
        for write in writes {
            match write {
                Write::Result(result) => {
                    state.results.insert(result.task_id, result);
                }
                Write::Records(task_id, records) => {
                    state
                        .records
                        .extend(records.into_iter().map(|record| (task_id, record)));
                }
                Write::CreateTask(task) => {
                    state.tasks.insert(task.id, task);
                }
                Write::SetState(id, new_state) => {
                    if let Some(task) = state.tasks.get_mut(&id) {
                        task.state = new_state;
                    }
                }
            }
        }
        debug!(writes = count, "Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(writes = self.writes.len(), "Transaction rolled back");
        Ok(())
    }
}
