//! Built-in verifiers
//!
//! | Kind            | Compares                  | Confidence                         |
//! |-----------------|---------------------------|------------------------------------|
//! | `equals`        | any value, exact match    | 1.0 if all identical, else 0.0     |
//! | `unordered_set` | sequences as sets         | 1.0 if all equal as sets, else 0.0 |
//! | `mapping`       | mappings, key by key      | minimum over all keys              |
//! | `majority`      | any value, grouped        | share of the largest group         |
//!
//! Only `majority` gives partial credit, and it is never chosen by default.

use super::rule::QuorumRule;
use super::verifier::{VerificationScope, Verdict, Verifier};
use crate::core::error::DomainError;
use crate::value::ValueTree;
use std::collections::BTreeSet;

pub const EQUALS: &str = "equals";
pub const UNORDERED_SET: &str = "unordered_set";
pub const MAPPING: &str = "mapping";
pub const MAJORITY: &str = "majority";

/// All values must be identical
#[derive(Debug, Default, Clone, Copy)]
pub struct EqualsVerifier;

impl Verifier for EqualsVerifier {
    fn kind(&self) -> &str {
        EQUALS
    }

    fn verify(
        &self,
        values: &[&ValueTree],
        _scope: &VerificationScope<'_>,
    ) -> Result<Verdict, DomainError> {
        let Some((first, rest)) = values.split_first() else {
            return Ok(Verdict::disagreed());
        };
        if rest.iter().all(|v| v == first) {
            Ok(Verdict::agreed((*first).clone()))
        } else {
            Ok(Verdict::disagreed())
        }
    }
}

/// Sequences must contain the same elements, ignoring order and repeats
///
/// The resolved value keeps the order of the first submission.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnorderedSetVerifier;

impl UnorderedSetVerifier {
    fn same_set(a: &[ValueTree], b: &[ValueTree]) -> bool {
        a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
    }
}

impl Verifier for UnorderedSetVerifier {
    fn kind(&self) -> &str {
        UNORDERED_SET
    }

    fn verify(
        &self,
        values: &[&ValueTree],
        _scope: &VerificationScope<'_>,
    ) -> Result<Verdict, DomainError> {
        let Some(sequences) = values
            .iter()
            .map(|v| v.as_sequence())
            .collect::<Option<Vec<_>>>()
        else {
            return Ok(Verdict::disagreed());
        };
        let Some((first, rest)) = sequences.split_first() else {
            return Ok(Verdict::disagreed());
        };

        if rest.iter().all(|other| Self::same_set(first, other)) {
            Ok(Verdict::agreed(ValueTree::Sequence(first.to_vec())))
        } else {
            Ok(Verdict::disagreed())
        }
    }
}

/// Verifies every key of a mapping independently
///
/// Each key is checked with the verifier resolved for its path. The overall
/// confidence is the minimum over all keys, so one disagreeing field fails
/// the whole mapping. A key missing from any submission is a disagreement.
#[derive(Debug, Default, Clone, Copy)]
pub struct MappingVerifier;

impl Verifier for MappingVerifier {
    fn kind(&self) -> &str {
        MAPPING
    }

    fn verify(
        &self,
        values: &[&ValueTree],
        scope: &VerificationScope<'_>,
    ) -> Result<Verdict, DomainError> {
        let Some(mappings) = values
            .iter()
            .map(|v| v.as_mapping())
            .collect::<Option<Vec<_>>>()
        else {
            return Ok(Verdict::disagreed());
        };
        if mappings.is_empty() {
            return Ok(Verdict::disagreed());
        }

        let keys: BTreeSet<&String> = mappings.iter().flat_map(|m| m.keys()).collect();
        let mut resolved = std::collections::BTreeMap::new();
        let mut confidence = 1.0_f64;

        for key in keys {
            let Some(children) = mappings
                .iter()
                .map(|m| m.get(key.as_str()))
                .collect::<Option<Vec<_>>>()
            else {
                return Ok(Verdict::disagreed());
            };

            let verdict = scope.child(key).verify(&children)?;
            let Some(value) = verdict.value else {
                return Ok(Verdict::disagreed());
            };
            confidence = confidence.min(verdict.confidence);
            resolved.insert(key.clone(), value);
        }

        Ok(Verdict::partial(ValueTree::Mapping(resolved), confidence))
    }
}

/// Accepts the most common value when it satisfies a [`QuorumRule`]
///
/// Values are grouped by structural equality. A tie for the largest group
/// is no consensus. Confidence is the largest group's share of the total.
#[derive(Debug, Default, Clone, Copy)]
pub struct MajorityVerifier {
    rule: QuorumRule,
}

impl MajorityVerifier {
    pub fn new(rule: QuorumRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> QuorumRule {
        self.rule
    }
}

impl Verifier for MajorityVerifier {
    fn kind(&self) -> &str {
        MAJORITY
    }

    fn verify(
        &self,
        values: &[&ValueTree],
        _scope: &VerificationScope<'_>,
    ) -> Result<Verdict, DomainError> {
        let mut groups: Vec<(&ValueTree, usize)> = Vec::new();
        for value in values {
            match groups.iter_mut().find(|(v, _)| *v == *value) {
                Some((_, count)) => *count += 1,
                None => groups.push((*value, 1)),
            }
        }

        let Some(largest) = groups.iter().map(|(_, c)| *c).max() else {
            return Ok(Verdict::disagreed());
        };
        let mut leaders = groups.iter().filter(|(_, c)| *c == largest);
        let (Some((winner, _)), None) = (leaders.next(), leaders.next()) else {
            return Ok(Verdict::disagreed());
        };

        if !self.rule.is_satisfied(largest, values.len()) {
            return Ok(Verdict::disagreed());
        }

        Ok(Verdict::partial(
            (*winner).clone(),
            largest as f64 / values.len() as f64,
        ))
    }
}
