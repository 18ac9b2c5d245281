//! Test doubles shared by the use-case tests

use crate::ports::task_store::{StoreError, TaskStore, TaskTransaction};
use crate::ports::verification_logger::{VerificationEvent, VerificationLogger};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tally_domain::submission::FlatFields;
use tally_domain::task::{
    DeclarativeTaskType, HookError, Submission, Task, TaskBehavior, TaskId, TaskSpec, TaskState,
    TaskTypeRegistry, VerifiedRecord, VerifiedRecords, VerifiedResult,
};
use tally_domain::value::ValueTree;

// ==================== Store ====================

#[derive(Default)]
pub struct StoreState {
    pub next_id: u64,
    pub next_sequence: u64,
    pub tasks: BTreeMap<TaskId, Task>,
    pub submissions: Vec<Submission>,
    pub results: BTreeMap<TaskId, VerifiedResult>,
    pub records: Vec<(TaskId, VerifiedRecord)>,
    pub commits: usize,
    pub rollbacks: usize,
}

/// Mutex-backed store; transactions buffer writes and apply them on commit
#[derive(Default, Clone)]
pub struct MockTaskStore {
    pub state: Arc<Mutex<StoreState>>,
    pub commit_delay: Option<Duration>,
    pub fail_commit: bool,
}

impl MockTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    pub fn with_failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn task(&self, id: TaskId) -> Task {
        self.state.lock().unwrap().tasks[&id].clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.values().cloned().collect()
    }

    pub fn result(&self, id: TaskId) -> Option<VerifiedResult> {
        self.state.lock().unwrap().results.get(&id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }

    /// Seed a task and its submissions, bypassing intake
    pub fn seed(&self, spec: TaskSpec, submissions: Vec<Vec<(&str, &str)>>) -> TaskId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = TaskId::new(state.next_id);
        let mut task = Task::from_spec(id, &spec);
        if !submissions.is_empty() {
            task.state = TaskState::AwaitingSubmissions;
        }
        state.tasks.insert(id, task);
        for pairs in submissions {
            state.next_sequence += 1;
            let sequence = state.next_sequence;
            state.submissions.push(Submission {
                task_id: id,
                sequence,
                fields: FlatFields::from_pairs(pairs),
                worker: None,
            });
        }
        id
    }
}

#[async_trait]
impl TaskStore for MockTaskStore {
    async fn create_task(&self, spec: TaskSpec) -> Result<Task, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let task = Task::from_spec(TaskId::new(state.next_id), &spec);
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn load_task(&self, id: TaskId) -> Result<Task, StoreError> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn load_submissions(&self, id: TaskId) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .filter(|s| s.task_id == id)
            .cloned()
            .collect())
    }

    async fn add_submission(
        &self,
        id: TaskId,
        fields: FlatFields,
        worker: Option<String>,
    ) -> Result<Submission, StoreError> {
        let mut state = self.state.lock().unwrap();
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
        state.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn set_state(&self, id: TaskId, new_state: TaskState) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let task = state.tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        task.state = new_state;
        Ok(())
    }

    async fn verified_result(&self, id: TaskId) -> Result<Option<VerifiedResult>, StoreError> {
        Ok(self.result(id))
    }

    async fn begin(&self) -> Result<Box<dyn TaskTransaction>, StoreError> {
        Ok(Box::new(MockTransaction {
            store: self.clone(),
            ops: Vec::new(),
        }))
    }
}

enum Op {
    Result(VerifiedResult),
    Records(TaskId, VerifiedRecords),
    Create(Task),
    State(TaskId, TaskState),
}

pub struct MockTransaction {
    store: MockTaskStore,
    ops: Vec<Op>,
}

#[async_trait]
impl TaskTransaction for MockTransaction {
    async fn save_verified_result(&mut self, result: VerifiedResult) -> Result<(), StoreError> {
        if self.store.result(result.task_id).is_some() {
            return Err(StoreError::Conflict(format!(
                "task {} already has a verified result",
                result.task_id
            )));
        }
        self.ops.push(Op::Result(result));
        Ok(())
    }

    async fn save_records(
        &mut self,
        task_id: TaskId,
        records: VerifiedRecords,
    ) -> Result<(), StoreError> {
        self.ops.push(Op::Records(task_id, records));
        Ok(())
    }

    async fn create_task(&mut self, spec: TaskSpec) -> Result<Task, StoreError> {
        let id = {
            let mut state = self.store.state.lock().unwrap();
            state.next_id += 1;
            TaskId::new(state.next_id)
        };
        let task = Task::from_spec(id, &spec);
        self.ops.push(Op::Create(task.clone()));
        Ok(task)
    }

    async fn set_state(&mut self, id: TaskId, state: TaskState) -> Result<(), StoreError> {
        self.ops.push(Op::State(id, state));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MockTransaction { store, ops } = *self;
        if let Some(delay) = store.commit_delay {
            tokio::time::sleep(delay).await;
        }
        if store.fail_commit {
            return Err(StoreError::Backend("disk unavailable".to_string()));
        }
        let mut state = store.state.lock().unwrap();
        for op in ops {
            match op {
                Op::Result(result) => {
                    state.results.insert(result.task_id, result);
                }
                Op::Records(task_id, records) => {
                    state
                        .records
                        .extend(records.into_iter().map(|r| (task_id, r)));
                }
                Op::Create(task) => {
                    state.tasks.insert(task.id, task);
                }
                Op::State(id, new_state) => {
                    if let Some(task) = state.tasks.get_mut(&id) {
                        task.state = new_state;
                    }
                }
            }
        }
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.store.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}

// ==================== Logger ====================

#[derive(Default)]
pub struct MockLogger {
    pub events: Mutex<Vec<(&'static str, TaskId, Value)>>,
}

impl MockLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.0).collect()
    }
}

impl VerificationLogger for MockLogger {
    fn log(&self, event: VerificationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.task_id, event.payload));
    }
}

// ==================== Task types ====================

/// Follow-on hook that always fails
pub struct BrokenFollowOn;

impl TaskBehavior for BrokenFollowOn {
    fn type_name(&self) -> &str {
        "broken"
    }

    fn save_verified(
        &self,
        _task: &Task,
        verified: &ValueTree,
        records: &mut VerifiedRecords,
    ) -> Result<(), HookError> {
        records.push("broken", verified.clone());
        Ok(())
    }

    fn follow_on(&self, _task: &Task, _verified: &ValueTree) -> Result<Vec<TaskSpec>, HookError> {
        Err(HookError::new("document service unavailable"))
    }
}

/// Save hook that always fails
pub struct FailingSave;

impl TaskBehavior for FailingSave {
    fn type_name(&self) -> &str {
        "failing_save"
    }

    fn save_verified(
        &self,
        _task: &Task,
        _verified: &ValueTree,
        _records: &mut VerifiedRecords,
    ) -> Result<(), HookError> {
        Err(HookError::new("db down"))
    }

    fn follow_on(&self, task: &Task, _verified: &ValueTree) -> Result<Vec<TaskSpec>, HookError> {
        Ok(vec![TaskSpec::new("transcribe_table", task.params.clone())])
    }
}

pub fn task_types() -> Arc<TaskTypeRegistry> {
    let mut registry = TaskTypeRegistry::new();
    registry
        .register(
            DeclarativeTaskType::new("find_table")
                .initial()
                .with_required_submissions(2)
                .with_follow_on("transcribe_table"),
        )
        .unwrap();
    registry
        .register(DeclarativeTaskType::new("transcribe_table").with_required_submissions(3))
        .unwrap();
    registry
        .register(DeclarativeTaskType::new("orphan").with_follow_on("ghost"))
        .unwrap();
    registry.register(BrokenFollowOn).unwrap();
    registry.register(FailingSave).unwrap();
    Arc::new(registry)
}

pub fn spec(task_type: &str) -> TaskSpec {
    TaskSpec::new(task_type, json!({"url": "https://bla.pl"}))
}
