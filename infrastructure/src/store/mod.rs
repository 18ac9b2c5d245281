//! Task store adapters.
//!
//! Provides [`InMemoryTaskStore`], an in-process implementation of the
//! [`TaskStore`](tally_application::TaskStore) port.

mod memory;

pub use memory::{InMemoryTaskStore, InMemoryTransaction};
