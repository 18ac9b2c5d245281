//! Value Tree - the normalized shape of a submission
//!
//! A [`ValueTree`] is what the field unpacker produces and what verifiers
//! compare. It is a tagged union over three shapes:
//!
//! - [`ValueTree::Scalar`] - a single string, number, bool or null
//! - [`ValueTree::Sequence`] - an ordered list of trees
//! - [`ValueTree::Mapping`] - string keys to trees (key order is irrelevant)
//!
//! Trees serialize as plain JSON, so they can be stored and exchanged
//! without an extra envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// A single leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// The three shapes a [`ValueTree`] can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Sequence,
    Mapping,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recursive, immutable value produced from a submission
///
/// # Example
///
/// ```
/// use tally_domain::value::ValueTree;
/// use serde_json::json;
///
/// let tree = ValueTree::from(json!({"name": "A", "tags": ["x", "y"]}));
/// assert!(tree.is_mapping());
/// assert_eq!(tree.get("name"), Some(&ValueTree::string("A")));
/// assert_eq!(tree.to_json(), json!({"name": "A", "tags": ["x", "y"]}));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ValueTree {
    Scalar(Scalar),
    Sequence(Vec<ValueTree>),
    Mapping(BTreeMap<String, ValueTree>),
}

impl ValueTree {
    /// String scalar
    pub fn string(value: impl Into<String>) -> Self {
        ValueTree::Scalar(Scalar::String(value.into()))
    }

    /// Null scalar
    pub fn null() -> Self {
        ValueTree::Scalar(Scalar::Null)
    }

    /// Sequence of string scalars, in the given order
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueTree::Sequence(values.into_iter().map(ValueTree::string).collect())
    }

    pub fn shape(&self) -> Shape {
        match self {
            ValueTree::Scalar(_) => Shape::Scalar,
            ValueTree::Sequence(_) => Shape::Sequence,
            ValueTree::Mapping(_) => Shape::Mapping,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, ValueTree::Scalar(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ValueTree::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ValueTree::Mapping(_))
    }

    pub fn as_sequence(&self) -> Option<&[ValueTree]> {
        match self {
            ValueTree::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, ValueTree>> {
        match self {
            ValueTree::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValueTree::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Look up a key of a mapping; `None` for other shapes
    pub fn get(&self, key: &str) -> Option<&ValueTree> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Convert into a `serde_json::Value`
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Value> for ValueTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ValueTree::Scalar(Scalar::Null),
            Value::Bool(b) => ValueTree::Scalar(Scalar::Bool(b)),
            Value::Number(n) => ValueTree::Scalar(Scalar::Number(n)),
            Value::String(s) => ValueTree::Scalar(Scalar::String(s)),
            Value::Array(items) => {
                ValueTree::Sequence(items.into_iter().map(ValueTree::from).collect())
            }
            Value::Object(map) => ValueTree::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, ValueTree::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<ValueTree> for Value {
    fn from(tree: ValueTree) -> Self {
        match tree {
            ValueTree::Scalar(Scalar::Null) => Value::Null,
            ValueTree::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            ValueTree::Scalar(Scalar::Number(n)) => Value::Number(n),
            ValueTree::Scalar(Scalar::String(s)) => Value::String(s),
            ValueTree::Sequence(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            ValueTree::Mapping(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl std::fmt::Display for ValueTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
