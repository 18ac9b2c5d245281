//! Configuration file loading for tally
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `TALLY_VERIFICATION__MIN_CONFIDENCE=0.6`
//! 2. `--config <path>` specified file
//! 3. Project root: `./tally.toml` or `./.tally.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/tally/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileLoggingConfig, FileTaskTypeConfig, FileVerificationConfig,
};
pub use loader::ConfigLoader;
