//! Task behavior - the extension point for task authors
//!
//! A task type declares how its submissions are verified (field kinds),
//! what happens to a verified answer (save hook) and which tasks it
//! spawns afterwards (follow-on hook). Both hooks run inside the same
//! unit of work as the verified-result commit; if either fails, nothing
//! is committed.

use super::entities::{DEFAULT_REQUIRED_SUBMISSIONS, Task, TaskSpec};
use crate::value::ValueTree;
use crate::verification::FieldKinds;
use thiserror::Error;

/// Failure raised by a task's save or follow-on hook
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One structured record staged by a save hook
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedRecord {
    /// Target collection (table, index, ...) in the application's data store
    pub collection: String,
    pub value: ValueTree,
}

/// Records staged by a save hook, written by the commit that verifies the task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifiedRecords {
    records: Vec<VerifiedRecord>,
}

impl VerifiedRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, collection: impl Into<String>, value: ValueTree) {
        self.records.push(VerifiedRecord {
            collection: collection.into(),
            value,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &VerifiedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for VerifiedRecords {
    type Item = VerifiedRecord;
    type IntoIter = std::vec::IntoIter<VerifiedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Concrete behavior of a task type
///
/// # Example
///
/// ```
/// use tally_domain::task::{HookError, Task, TaskBehavior, TaskSpec, VerifiedRecords};
/// use tally_domain::value::ValueTree;
///
/// struct FindTable;
///
/// impl TaskBehavior for FindTable {
///     fn type_name(&self) -> &str {
///         "find_table"
///     }
///
///     fn save_verified(
///         &self,
///         _task: &Task,
///         verified: &ValueTree,
///         records: &mut VerifiedRecords,
///     ) -> Result<(), HookError> {
///         records.push("tables", verified.clone());
///         Ok(())
///     }
///
///     fn follow_on(&self, task: &Task, _verified: &ValueTree) -> Result<Vec<TaskSpec>, HookError> {
///         Ok(vec![TaskSpec::new("transcribe_table", task.params.clone())])
///     }
/// }
/// ```
pub trait TaskBehavior: Send + Sync {
    /// Stable type name the task is stored under
    fn type_name(&self) -> &str;

    /// Declared verifier kinds by field path
    fn field_kinds(&self) -> FieldKinds {
        FieldKinds::new()
    }

    /// Submissions to collect before verifying
    fn required_submissions(&self) -> usize {
        DEFAULT_REQUIRED_SUBMISSIONS
    }

    /// Whether a task of this type is created for every new document
    fn is_initial(&self) -> bool {
        false
    }

    /// Stage the verified answer as structured records
    fn save_verified(
        &self,
        task: &Task,
        verified: &ValueTree,
        records: &mut VerifiedRecords,
    ) -> Result<(), HookError>;

    /// Tasks to create after the answer is saved
    fn follow_on(&self, _task: &Task, _verified: &ValueTree) -> Result<Vec<TaskSpec>, HookError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_keep_order() {
        let mut records = VerifiedRecords::new();
        records.push("a", ValueTree::string("1"));
        records.push("b", ValueTree::string("2"));

        let collections: Vec<_> = records.iter().map(|r| r.collection.as_str()).collect();
        assert_eq!(collections, vec!["a", "b"]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_hook_error_display() {
        assert_eq!(HookError::new("disk full").to_string(), "disk full");
    }
}
