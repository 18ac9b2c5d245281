//! Domain layer for tally
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Submissions
//!
//! Workers answer a task with a flat form: `name=A`, `rows[0][amount]=12`.
//! [`submission::unpack`] turns that into a nested [`ValueTree`].
//!
//! ## Verification
//!
//! Each task is answered several times. The [`ConsensusEngine`] compares
//! all answers field by field through pluggable [`Verifier`]s and yields a
//! resolved value with a confidence in `[0, 1]`.
//!
//! ## Tasks
//!
//! A [`TaskBehavior`] says how a task type is verified, where its verified
//! answer goes and which follow-on tasks it spawns.

pub mod config;
pub mod core;
pub mod submission;
pub mod task;
pub mod value;
pub mod verification;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::error::DomainError;
pub use submission::{FieldPath, FieldValues, FlatFields, unpack};
pub use task::{
    DeclarativeTaskType, HookError, Submission, Task, TaskBehavior, TaskId, TaskSpec, TaskState,
    TaskTypeRegistry, VerifiedRecords, VerifiedResult,
};
pub use value::{Scalar, Shape, ValueTree};
pub use verification::{
    ConsensusEngine, ConsensusOutcome, ConsensusReport, FieldKinds, QuorumRule, Verdict,
    Verifier, VerifierRegistry,
};
