//! Per-task lock table
//!
//! Serializes lifecycle work on the same task while letting different
//! tasks proceed in parallel. An entry lives only as long as some caller
//! holds or waits for its lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tally_domain::task::TaskId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard for exclusive access to one task
pub type TaskGuard = OwnedMutexGuard<()>;

/// Shared table of per-task async mutexes
#[derive(Clone, Default)]
pub struct TaskLocks {
    table: Arc<Mutex<HashMap<TaskId, Weak<AsyncMutex<()>>>>>,
}

impl TaskLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `task_id`
    pub async fn acquire(&self, task_id: TaskId) -> TaskGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table.retain(|_, entry| entry.strong_count() > 0);
            match table.get(&task_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    table.insert(task_id, Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    /// Number of tasks currently locked or awaited
    pub fn active(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.values().filter(|e| e.strong_count() > 0).count()
    }
}

impl std::fmt::Debug for TaskLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskLocks")
            .field("active", &self.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_dropped_after_release() {
        let locks = TaskLocks::new();
        {
            let _guard = locks.acquire(TaskId::new(1)).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_same_task_is_serialized() {
        let locks = TaskLocks::new();
        let guard = locks.acquire(TaskId::new(1)).await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = other.acquire(TaskId::new(1)).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_tasks_do_not_block() {
        let locks = TaskLocks::new();
        let _a = locks.acquire(TaskId::new(1)).await;
        let result = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(TaskId::new(2)),
        )
        .await;
        assert!(result.is_ok());
    }
}
