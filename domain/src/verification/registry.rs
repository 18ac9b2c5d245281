//! Verifier Registry
//!
//! Maps a declared field kind to a [`Verifier`]. When a field has no declared
//! kind, the default is chosen by the shape of the value:
//!
//! | Shape    | Default kind    |
//! |----------|-----------------|
//! | mapping  | `mapping`       |
//! | sequence | `unordered_set` |
//! | scalar   | `equals`        |
//!
//! Registering a verifier under an existing kind replaces it, which also
//! replaces the shape default for that kind.

use super::builtin::{
    EQUALS, EqualsVerifier, MAJORITY, MAPPING, MajorityVerifier, MappingVerifier, UNORDERED_SET,
    UnorderedSetVerifier,
};
use super::rule::QuorumRule;
use super::verifier::Verifier;
use crate::core::error::DomainError;
use crate::value::{Shape, ValueTree};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of verifiers keyed by kind name
///
/// # Example
///
/// ```
/// use tally_domain::verification::VerifierRegistry;
/// use tally_domain::value::ValueTree;
///
/// let registry = VerifierRegistry::with_builtins();
/// let verifier = registry.resolve(None, &ValueTree::strings(["x"])).unwrap();
/// assert_eq!(verifier.kind(), "unordered_set");
///
/// let verifier = registry.resolve(Some("equals"), &ValueTree::strings(["x"])).unwrap();
/// assert_eq!(verifier.kind(), "equals");
/// ```
pub struct VerifierRegistry {
    verifiers: HashMap<String, Arc<dyn Verifier>>,
}

impl VerifierRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            verifiers: HashMap::new(),
        }
    }

    /// Registry with `equals`, `unordered_set`, `mapping` and `majority`
    pub fn with_builtins() -> Self {
        Self::new()
            .register(EqualsVerifier)
            .register(UnorderedSetVerifier)
            .register(MappingVerifier)
            .register(MajorityVerifier::default())
    }

    /// Replace the rule used by the `majority` verifier
    pub fn with_majority_rule(self, rule: QuorumRule) -> Self {
        self.register(MajorityVerifier::new(rule))
    }

    /// Register a verifier under its own kind
    pub fn register<V: Verifier + 'static>(self, verifier: V) -> Self {
        self.register_arc(Arc::new(verifier))
    }

    /// Register a verifier (Arc version)
    pub fn register_arc(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifiers.insert(verifier.kind().to_string(), verifier);
        self
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn Verifier>> {
        self.verifiers.get(kind).cloned()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.verifiers.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.verifiers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Default kind for a value shape
    pub fn default_kind(shape: Shape) -> &'static str {
        match shape {
            Shape::Mapping => MAPPING,
            Shape::Sequence => UNORDERED_SET,
            Shape::Scalar => EQUALS,
        }
    }

    /// Resolve the verifier for a field
    ///
    /// A declared kind wins; otherwise the kind is picked from the shape of
    /// `sample`. Fails with [`DomainError::UnknownVerifier`] when the kind is
    /// not registered.
    pub fn resolve(
        &self,
        declared: Option<&str>,
        sample: &ValueTree,
    ) -> Result<Arc<dyn Verifier>, DomainError> {
        let kind = declared.unwrap_or_else(|| Self::default_kind(sample.shape()));
        self.get(kind)
            .ok_or_else(|| DomainError::UnknownVerifier(kind.to_string()))
    }
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for VerifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
