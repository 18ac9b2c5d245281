//! Raw submitted form fields
//!
//! [`FlatFields`] is the multimap a worker's form submission arrives as:
//! bracket-annotated keys, each with one or more string values in the order
//! they were submitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One value or several values submitted under a single key.
///
/// Used for the JSON form of [`FlatFields`]: `{"name": "A", "tags[]": ["x", "y"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValues {
    One(String),
    Many(Vec<String>),
}

impl From<FieldValues> for Vec<String> {
    fn from(values: FieldValues) -> Self {
        match values {
            FieldValues::One(v) => vec![v],
            FieldValues::Many(vs) => vs,
        }
    }
}

/// Flat multimap of submitted fields, keys in first-arrival order
///
/// # Example
///
/// ```
/// use tally_domain::submission::FlatFields;
///
/// let fields = FlatFields::from_pairs([("tags[]", "x"), ("name", "A"), ("tags[]", "y")]);
/// assert_eq!(fields.len(), 2);
/// assert_eq!(fields.values("tags[]"), Some(&["x".to_string(), "y".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, FieldValues>",
    into = "BTreeMap<String, FieldValues>"
)]
pub struct FlatFields {
    entries: Vec<(String, Vec<String>)>,
}

impl FlatFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs; repeated keys accumulate values
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Self::new();
        for (key, value) in pairs {
            fields.push(key, value);
        }
        fields
    }

    /// Append a value under `key`, keeping submission order
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Builder form of [`push`](Self::push)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, FieldValues>> for FlatFields {
    fn from(map: BTreeMap<String, FieldValues>) -> Self {
        Self {
            entries: map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

impl From<FlatFields> for BTreeMap<String, FieldValues> {
    fn from(fields: FlatFields) -> Self {
        fields
            .entries
            .into_iter()
            .map(|(k, mut v)| {
                let values = if v.len() == 1 {
                    FieldValues::One(v.remove(0))
                } else {
                    FieldValues::Many(v)
                };
                (k, values)
            })
            .collect()
    }
}
