//! Application-level configuration.
//!
//! - [`VerificationParams`] - thresholds and the commit timeout for the task lifecycle

pub mod verification_params;

pub use verification_params::VerificationParams;
