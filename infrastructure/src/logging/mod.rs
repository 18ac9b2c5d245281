//! Logging infrastructure - structured verification audit logging.
//!
//! Provides [`JsonlVerificationLogger`], a JSONL file writer that implements
//! the [`VerificationLogger`](tally_application::VerificationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlVerificationLogger;
