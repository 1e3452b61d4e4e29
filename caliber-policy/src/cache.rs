//! Verdict cache (spec.md §3 "Verdict Cache", §9 Open Question
//! resolution #1): last-computed-verdict reuse keyed by
//! `(PolicyKind, valuation fingerprint, policy-set fingerprint)`.
//!
//! The source (`Guard.saved_action_hash`/`saved_action_result`) keys on
//! a single `hash(str(msg))` shared between the action-policy and
//! message-policy call sites, which can collide between the two
//! domains. DESIGN.md records this as a deliberate deviation: including
//! [`PolicyKind`] in the key eliminates that collision while preserving
//! every other observed semantic (single-slot storage is sufficient;
//! the struct holds a `Vec` only so callers may opt into a small LRU
//! without changing behavior, per spec.md §9).

use crate::store::PolicySet;
use crate::verifier::Verdict;
use caliber_dsl::eval::Valuation;
use sha2::{Digest, Sha256};

use crate::store::PolicyKind;

/// A deterministic fingerprint over `(kind, valuation, policy_set)`.
/// Canonical because both inputs are serialized from sorted/ordered
/// collections: `Valuation` is a `BTreeMap` (sorted by key) and
/// `PolicySet` is serialized in its stored insertion order, which is
/// itself a canonical representation of "this exact policy set".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn compute(kind: PolicyKind, valuation: &Valuation, policies: &PolicySet) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(match kind {
            PolicyKind::Action => b"action" as &[u8],
            PolicyKind::Message => b"message" as &[u8],
        });
        hasher.update(b"|valuation|");
        for (name, value) in valuation {
            hasher.update(name.as_str().as_bytes());
            hasher.update([if *value { 1 } else { 0 }]);
        }
        hasher.update(b"|policies|");
        for (name, logic) in policies {
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(logic.as_bytes());
        }
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Fingerprint(out)
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

/// A single-slot (per `PolicyKind`) verdict cache. Two slots — one per
/// [`PolicyKind`] — rather than a bare single slot, which is what
/// actually eliminates the cross-domain collision described above;
/// within each slot, only the most recent `(fingerprint, verdict)` pair
/// is retained, matching the source's observed capacity.
#[derive(Debug, Clone, Default)]
pub struct VerdictCache {
    action_slot: Option<(Fingerprint, Verdict)>,
    message_slot: Option<(Fingerprint, Verdict)>,
}

impl VerdictCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: PolicyKind) -> &Option<(Fingerprint, Verdict)> {
        match kind {
            PolicyKind::Action => &self.action_slot,
            PolicyKind::Message => &self.message_slot,
        }
    }

    fn slot_mut(&mut self, kind: PolicyKind) -> &mut Option<(Fingerprint, Verdict)> {
        match kind {
            PolicyKind::Action => &mut self.action_slot,
            PolicyKind::Message => &mut self.message_slot,
        }
    }

    /// Look up a cached verdict for this exact fingerprint within
    /// `kind`'s slot. Returns `None` on a miss (fingerprint mismatch or
    /// empty slot) -- the cache never evicts explicitly; a new fingerprint
    /// simply overwrites the slot (spec.md §5 "the verdict cache is
    /// invalidated implicitly by fingerprint mismatch rather than
    /// explicit eviction").
    pub fn get(&self, kind: PolicyKind, fingerprint: Fingerprint) -> Option<&Verdict> {
        self.slot(kind)
            .as_ref()
            .filter(|(cached_fp, _)| *cached_fp == fingerprint)
            .map(|(_, verdict)| verdict)
    }

    pub fn put(&mut self, kind: PolicyKind, fingerprint: Fingerprint, verdict: Verdict) {
        *self.slot_mut(kind) = Some((fingerprint, verdict));
    }
}
