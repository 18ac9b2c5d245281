//! Application layer for tally
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::VerificationParams;
pub use ports::{
    task_store::{StoreError, TaskStore, TaskTransaction},
    verification_logger::{
        NoVerificationLogger, VerificationEvent, VerificationLogger,
    },
};
pub use use_cases::create_tasks::{CreateTasksError, CreateTasksUseCase};
pub use use_cases::handle_notification::{
    HandleNotificationUseCase, NotificationError, TaskNotification,
};
pub use use_cases::record_submission::{
    RecordSubmissionError, RecordSubmissionInput, RecordSubmissionUseCase,
};
pub use use_cases::task_locks::TaskLocks;
pub use use_cases::verify_task::{VerificationOutcome, VerifyTaskError, VerifyTaskUseCase};
