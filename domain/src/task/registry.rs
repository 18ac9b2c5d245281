//! Task Type Registry
//!
//! Maps a stored type name to its [`TaskBehavior`]. The registry is built
//! once at startup from the application's task definitions, then shared
//! read-only (typically behind an `Arc`) by the lifecycle use cases.

use super::behavior::TaskBehavior;
use super::entities::TaskSpec;
use crate::core::error::DomainError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of task behaviors keyed by type name
#[derive(Default)]
pub struct TaskTypeRegistry {
    types: HashMap<String, Arc<dyn TaskBehavior>>,
    /// Registration order, for stable listings
    order: Vec<String>,
}

impl TaskTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behavior under its type name
    pub fn register<B: TaskBehavior + 'static>(&mut self, behavior: B) -> Result<(), DomainError> {
        self.register_arc(Arc::new(behavior))
    }

    /// Register a behavior (Arc version)
    pub fn register_arc(&mut self, behavior: Arc<dyn TaskBehavior>) -> Result<(), DomainError> {
        let name = behavior.type_name().to_string();
        if self.types.contains_key(&name) {
            return Err(DomainError::DuplicateTaskType(name));
        }
        self.order.push(name.clone());
        self.types.insert(name, behavior);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<B: TaskBehavior + 'static>(mut self, behavior: B) -> Result<Self, DomainError> {
        self.register(behavior)?;
        Ok(self)
    }

    /// Look up the behavior for a stored type name
    pub fn resolve(&self, type_name: &str) -> Result<Arc<dyn TaskBehavior>, DomainError> {
        self.types
            .get(type_name)
            .cloned()
            .ok_or_else(|| DomainError::UnknownTaskType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Type names in registration order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Behaviors flagged as initial, in registration order
    pub fn initial_types(&self) -> Vec<Arc<dyn TaskBehavior>> {
        self.order
            .iter()
            .filter_map(|name| self.types.get(name))
            .filter(|b| b.is_initial())
            .cloned()
            .collect()
    }

    /// Fill in the required submission count from the type when the spec omits it
    pub fn complete_spec(&self, mut spec: TaskSpec) -> TaskSpec {
        if spec.required_submissions.is_none() {
            if let Some(behavior) = self.types.get(&spec.task_type) {
                spec.required_submissions = Some(behavior.required_submissions());
            }
        }
        spec
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl std::fmt::Debug for TaskTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTypeRegistry")
            .field("types", &self.order)
            .finish()
    }
}
