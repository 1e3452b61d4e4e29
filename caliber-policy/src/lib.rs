//! Predicate/rule store, policy verifier, and verdict cache for the
//! CALIBER guard (C1, C5, spec.md §3-§4.4).

pub mod cache;
pub mod store;
pub mod verifier;

pub use cache::{Fingerprint, VerdictCache};
pub use store::{Predicate, PolicyKind, PolicySet, PredicateStore};
pub use verifier::{verify, Verdict};
