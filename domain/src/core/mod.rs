//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] - domain-level errors
//! - [`time::current_timestamp`] - wall clock in milliseconds

pub mod error;
pub mod time;
