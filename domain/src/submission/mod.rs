//! Submission normalization
//!
//! Workers submit loosely-structured, bracket-annotated form fields.
//! This module parses those keys and unpacks them into [`ValueTree`]s
//! that the consensus engine can compare.
//!
//! [`ValueTree`]: crate::value::ValueTree

pub mod field_name;
pub mod fields;
pub mod unpack;

pub use field_name::{FieldPath, is_numeric_index};
pub use fields::{FieldValues, FlatFields};
pub use unpack::unpack;
