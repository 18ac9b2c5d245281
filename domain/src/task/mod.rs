//! Tasks and task types
//!
//! A task is one unit of crowdsourced work. Its type decides how
//! submissions are compared and what happens once they agree.

pub mod behavior;
pub mod declarative;
pub mod entities;
pub mod registry;

pub use behavior::{HookError, TaskBehavior, VerifiedRecord, VerifiedRecords};
pub use declarative::{DeclarativeTaskType, INPUT_PARAM, PARENT_TASK_PARAM};
pub use entities::{
    DEFAULT_REQUIRED_SUBMISSIONS, Submission, Task, TaskId, TaskSpec, TaskState, VerifiedResult,
};
pub use registry::TaskTypeRegistry;
