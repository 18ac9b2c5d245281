//! Verifier trait and the values it works with
//!
//! A [`Verifier`] compares the same logical value across N submissions and
//! returns a [`Verdict`]: the resolved value (if the submissions agree) and a
//! confidence in `[0, 1]`. Nested shapes are verified recursively through a
//! [`VerificationScope`], which knows the current field path and how to
//! resolve the verifier for a child field.

use super::registry::VerifierRegistry;
use crate::core::error::DomainError;
use crate::value::ValueTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of comparing one field across submissions
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Agreed value, `None` when the submissions disagree
    pub value: Option<ValueTree>,
    /// Agreement strength in `[0, 1]`
    pub confidence: f64,
}

impl Verdict {
    /// Full agreement on `value`
    pub fn agreed(value: ValueTree) -> Self {
        Self {
            value: Some(value),
            confidence: 1.0,
        }
    }

    /// Partial agreement on `value`
    pub fn partial(value: ValueTree, confidence: f64) -> Self {
        Self {
            value: Some(value),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// No consensus
    pub fn disagreed() -> Self {
        Self {
            value: None,
            confidence: 0.0,
        }
    }

    pub fn is_agreed(&self) -> bool {
        self.value.is_some()
    }
}

/// Declared verifier kinds, keyed by dotted field path
///
/// The empty path `""` is the submission root; `owner.address` is the
/// `address` key inside the `owner` mapping.
///
/// ```
/// use tally_domain::verification::FieldKinds;
///
/// let kinds = FieldKinds::new().with("tags", "unordered_set");
/// assert_eq!(kinds.kind_at("tags"), Some("unordered_set"));
/// assert_eq!(kinds.kind_at("name"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKinds(BTreeMap<String, String>);

impl FieldKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, kind: impl Into<String>) -> Self {
        self.0.insert(path.into(), kind.into());
        self
    }

    pub fn kind_at(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, k)| (p.as_str(), k.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<P: Into<String>, K: Into<String>> FromIterator<(P, K)> for FieldKinds {
    fn from_iter<I: IntoIterator<Item = (P, K)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(p, k)| (p.into(), k.into()))
                .collect(),
        )
    }
}

/// Where in the tree a verifier is running, and how to resolve children
pub struct VerificationScope<'a> {
    registry: &'a VerifierRegistry,
    field_kinds: &'a FieldKinds,
    path: String,
}

impl<'a> VerificationScope<'a> {
    /// Scope for the submission root
    pub fn root(registry: &'a VerifierRegistry, field_kinds: &'a FieldKinds) -> Self {
        Self {
            registry,
            field_kinds,
            path: String::new(),
        }
    }

    /// Scope for a key inside the current mapping
    pub fn child(&self, key: &str) -> VerificationScope<'a> {
        let path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        };
        VerificationScope {
            registry: self.registry,
            field_kinds: self.field_kinds,
            path,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Verifier for the current path: declared kind first, then by shape
    pub fn resolve(&self, sample: &ValueTree) -> Result<Arc<dyn Verifier>, DomainError> {
        self.registry
            .resolve(self.field_kinds.kind_at(&self.path), sample)
    }

    /// Resolve and run the verifier for the current path
    pub fn verify(&self, values: &[&ValueTree]) -> Result<Verdict, DomainError> {
        let Some(sample) = values.first() else {
            return Ok(Verdict::disagreed());
        };
        self.resolve(sample)?.verify(values, self)
    }
}

/// Pluggable comparator for one logical value across submissions
///
/// Implementations must be order-independent across submissions and must
/// never privilege one submission when they disagree.
pub trait Verifier: Send + Sync {
    /// Kind name this verifier is registered under
    fn kind(&self) -> &str;

    /// Compare `values` (one per submission, at least two in practice)
    fn verify(
        &self,
        values: &[&ValueTree],
        scope: &VerificationScope<'_>,
    ) -> Result<Verdict, DomainError>;
}
