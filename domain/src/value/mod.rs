//! Value trees
//!
//! The normalized, dynamically-shaped representation of a submission.

pub mod tree;

pub use tree::{Scalar, Shape, ValueTree};
