//! Use cases (application services)
//!
//! Use cases orchestrate domain logic and coordinate with external services via ports.

pub mod create_tasks;
pub mod handle_notification;
pub mod record_submission;
pub mod task_locks;
pub mod verify_task;

#[cfg(test)]
mod test_support;
