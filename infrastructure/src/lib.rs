//! Infrastructure layer for tally
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileLoggingConfig, FileTaskTypeConfig, FileVerificationConfig,
};
pub use logging::JsonlVerificationLogger;
pub use store::InMemoryTaskStore;
