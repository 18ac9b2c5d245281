//! Consensus verification
//!
//! This module compares redundant submissions of the same task and decides
//! whether they agree.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ConsensusEngine::cross_check(field_kinds, submissions)      │
//! │     │                                                        │
//! │     ▼                                                        │
//! │  VerifierRegistry::resolve(declared kind | value shape)      │
//! │     │                                                        │
//! │     ├── equals         (scalars, exact match)                │
//! │     ├── unordered_set  (sequences, order ignored)            │
//! │     ├── mapping        (recurses per key, min confidence)    │
//! │     └── majority       (opt-in, QuorumRule)                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Default verifiers are unanimous-or-nothing. Partial agreement is only
//! available through explicitly declared kinds.

pub mod builtin;
pub mod consensus;
pub mod registry;
pub mod rule;
pub mod verifier;

pub use builtin::{EqualsVerifier, MajorityVerifier, MappingVerifier, UnorderedSetVerifier};
pub use consensus::{
    ConsensusEngine, ConsensusOutcome, ConsensusReport, MIN_CONFIDENCE, MIN_SUBMISSIONS,
};
pub use registry::VerifierRegistry;
pub use rule::QuorumRule;
pub use verifier::{FieldKinds, VerificationScope, Verdict, Verifier};
