//! Task types defined by configuration rather than code

use super::behavior::{HookError, TaskBehavior, VerifiedRecords};
use super::entities::{DEFAULT_REQUIRED_SUBMISSIONS, Task, TaskSpec};
use crate::value::ValueTree;
use crate::verification::FieldKinds;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameter key linking a follow-on task to the task that spawned it
pub const PARENT_TASK_PARAM: &str = "parent_task";
/// Parameter key carrying the parent's verified value
pub const INPUT_PARAM: &str = "input";

/// A [`TaskBehavior`] described entirely by data
///
/// The save hook stages the verified value into `collection` (the type
/// name when unset). The follow-on hook creates one task per listed type,
/// passing along the parent's params plus [`PARENT_TASK_PARAM`] and
/// [`INPUT_PARAM`].
///
/// ```
/// use tally_domain::task::{DeclarativeTaskType, TaskBehavior};
///
/// let find_table = DeclarativeTaskType::new("find_table")
///     .initial()
///     .with_field("pages", "unordered_set")
///     .with_follow_on("transcribe_table");
///
/// assert!(find_table.is_initial());
/// assert_eq!(find_table.field_kinds().kind_at("pages"), Some("unordered_set"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeTaskType {
    name: String,
    field_kinds: FieldKinds,
    required_submissions: usize,
    initial: bool,
    follow_on: Vec<String>,
    collection: Option<String>,
}

impl DeclarativeTaskType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_kinds: FieldKinds::new(),
            required_submissions: DEFAULT_REQUIRED_SUBMISSIONS,
            initial: false,
            follow_on: Vec::new(),
            collection: None,
        }
    }

    pub fn with_field(mut self, path: impl Into<String>, kind: impl Into<String>) -> Self {
        self.field_kinds = self.field_kinds.with(path, kind);
        self
    }

    pub fn with_field_kinds(mut self, field_kinds: FieldKinds) -> Self {
        self.field_kinds = field_kinds;
        self
    }

    pub fn with_required_submissions(mut self, n: usize) -> Self {
        self.required_submissions = n;
        self
    }

    /// Mark as created for every new document
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn with_follow_on(mut self, task_type: impl Into<String>) -> Self {
        self.follow_on.push(task_type.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn follow_on_types(&self) -> &[String] {
        &self.follow_on
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.name)
    }

    fn follow_on_params(&self, task: &Task, verified: &ValueTree) -> Value {
        let mut params = match &task.params {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("params".to_string(), other.clone());
                map
            }
        };
        params.insert(PARENT_TASK_PARAM.to_string(), Value::from(task.id.value()));
        params.insert(INPUT_PARAM.to_string(), verified.to_json());
        Value::Object(params)
    }
}

impl TaskBehavior for DeclarativeTaskType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn field_kinds(&self) -> FieldKinds {
        self.field_kinds.clone()
    }

    fn required_submissions(&self) -> usize {
        self.required_submissions
    }

    fn is_initial(&self) -> bool {
        self.initial
    }

    fn save_verified(
        &self,
        _task: &Task,
        verified: &ValueTree,
        records: &mut VerifiedRecords,
    ) -> Result<(), HookError> {
        records.push(self.collection(), verified.clone());
        Ok(())
    }

    fn follow_on(&self, task: &Task, verified: &ValueTree) -> Result<Vec<TaskSpec>, HookError> {
        Ok(self
            .follow_on
            .iter()
            .map(|task_type| TaskSpec::new(task_type, self.follow_on_params(task, verified)))
            .collect())
    }
}
