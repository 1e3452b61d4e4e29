//! Predicate/Rule store (C1, spec.md §3).
//!
//! An in-memory mapping of predicate name -> record and rule name ->
//! logic, mirroring `Guard.predicates`/`Guard.policies` in
//! `src/guard/agent.py`, with the auto-creation invariant from spec.md §3
//! ("a predicate referenced by any active rule but absent from the store
//! is auto-created with description=name, keywords=[], default=false").

use caliber_core::PredicateName;
use caliber_dsl::eval::Valuation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An ordered rule-name -> logic map. `IndexMap` preserves insertion
/// order, which spec.md §4.4 requires the verifier to evaluate in
/// ("insertion order") — a plain `BTreeMap` would silently re-sort rules
/// alphabetically instead.
pub type PolicySet = IndexMap<String, String>;

/// A named boolean fact about the conversation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub name: PredicateName,
    pub description: String,
    pub keywords: Vec<String>,
    pub value: bool,
    pub default: bool,
}

impl Predicate {
    /// Construct the auto-created form of a predicate referenced by a
    /// rule but otherwise unseen: `description=name, keywords=[],
    /// default=false` (spec.md §3).
    pub fn auto_created(name: PredicateName) -> Self {
        let description = name.as_str().to_string();
        Self {
            name,
            description,
            keywords: Vec::new(),
            value: false,
            default: false,
        }
    }

    /// The serialized text used as the predicate index's document body
    /// for this record (spec.md §3 "Predicate Index").
    pub fn index_document(&self) -> String {
        format!(
            "{{'description': '{}', 'keywords': {:?}, 'value': {}}}",
            self.description, self.keywords, self.value
        )
    }
}

/// Which policy set a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    Action,
    Message,
}

/// An in-memory predicate store plus the two named rule maps (action
/// policy, message policy) that reference it.
#[derive(Debug, Clone, Default)]
pub struct PredicateStore {
    predicates: BTreeMap<PredicateName, Predicate>,
    /// The currently active action-policy set: rule name -> logic text.
    action_policies: PolicySet,
    /// The action-policy set stashed aside by `deactivate_policies`.
    stashed_action_policies: Option<PolicySet>,
    /// The message-policy set, if one has been loaded (`None` means no
    /// message policy is installed, per spec.md §4.6 step 7).
    message_policies: Option<PolicySet>,
}

impl PredicateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn predicates(&self) -> &BTreeMap<PredicateName, Predicate> {
        &self.predicates
    }

    pub fn action_policies(&self) -> &PolicySet {
        &self.action_policies
    }

    pub fn message_policies(&self) -> Option<&PolicySet> {
        self.message_policies.as_ref()
    }

    /// Insert or overwrite a predicate's description/keywords/default
    /// value wholesale (used by `add_policy_from_dict`).
    pub fn upsert_predicate(
        &mut self,
        name: PredicateName,
        description: impl Into<String>,
        keywords: Vec<String>,
        default: bool,
    ) {
        let entry = self.predicates.entry(name.clone()).or_insert_with(|| Predicate {
            name: name.clone(),
            description: String::new(),
            keywords: Vec::new(),
            value: default,
            default,
        });
        entry.description = description.into();
        entry.keywords = keywords;
        entry.default = default;
        entry.value = default;
    }

    /// Mutate only the current value of an existing predicate (C3's
    /// update path). Unknown names are ignored, matching spec.md §4.2
    /// ("unknown names are ignored by C7").
    pub fn apply_valuation_update(&mut self, name: &str, value: bool) {
        if let Some(p) = self.predicates.get_mut(name) {
            p.value = value;
        }
    }

    /// Install a rule into the named policy kind, after ensuring every
    /// identifier it references exists in the store (auto-creating
    /// `false`-default predicates for any that don't, spec.md §3's
    /// invariant).
    pub fn insert_rule(&mut self, kind: PolicyKind, rule_name: impl Into<String>, logic: impl Into<String>) {
        let logic = logic.into();
        self.auto_create_missing(&logic);
        match kind {
            PolicyKind::Action => {
                self.action_policies.insert(rule_name.into(), logic);
            }
            PolicyKind::Message => {
                self.message_policies
                    .get_or_insert_with(IndexMap::new)
                    .insert(rule_name.into(), logic);
            }
        }
    }

    /// Replace the message policy wholesale (used when loading a fresh
    /// message-policy document, mirroring `add_message_policy_from_dict`
    /// resetting `self.message_policy = dict()` before inserting).
    pub fn reset_message_policies(&mut self) {
        self.message_policies = Some(IndexMap::new());
    }

    /// Parse `logic`'s identifiers and auto-create any predicate not yet
    /// present in the store.
    pub fn auto_create_missing(&mut self, logic: &str) {
        if let Ok(expr) = caliber_dsl::parser::parse(logic) {
            for name in expr.identifiers() {
                let key = PredicateName::from(name.clone());
                self.predicates
                    .entry(key.clone())
                    .or_insert_with(|| Predicate::auto_created(key));
            }
        }
    }

    /// Re-scan every active rule (action + message) and auto-create any
    /// predicate referenced but missing, matching
    /// `Guard.add_missing_predicates`.
    pub fn add_missing_predicates(&mut self) {
        let logics: Vec<String> = self
            .action_policies
            .values()
            .cloned()
            .chain(self.message_policies.iter().flat_map(|m| m.values().cloned()))
            .collect();
        for logic in logics {
            self.auto_create_missing(&logic);
        }
    }

    /// Snapshot the active action policy set aside and clear it
    /// (`Guard.deactivate_policies`).
    pub fn deactivate_policies(&mut self) {
        let current = std::mem::take(&mut self.action_policies);
        self.stashed_action_policies = Some(current);
    }

    /// Install the named subset of the stashed action policy set as the
    /// active set (`Guard.activate_policy`). Names absent from the stash
    /// are skipped silently. Only stashes the currently active set if
    /// nothing has been stashed yet — a prior `deactivate_policies()`
    /// call's stash must survive, not be clobbered by re-stashing the
    /// (now empty) active set.
    pub fn activate_policy(&mut self, names: &[String]) {
        if self.stashed_action_policies.is_none() {
            self.deactivate_policies();
        }
        if let Some(stash) = &self.stashed_action_policies {
            let mut next = IndexMap::new();
            for name in names {
                if let Some(logic) = stash.get(name) {
                    next.insert(name.clone(), logic.clone());
                }
            }
            self.action_policies = next;
        }
    }

    /// A full valuation snapshot over the entire predicate store
    /// (spec.md §4.6 step 8: "valuation = {name -> value} over the
    /// entire predicate store").
    pub fn full_valuation(&self) -> Valuation {
        self.predicates
            .iter()
            .map(|(name, p)| (name.clone(), p.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_creates_predicates_referenced_by_a_rule() {
        let mut store = PredicateStore::new();
        store.insert_rule(PolicyKind::Action, "no_delete", "is_deleting IMPLIES is_authorized");
        assert!(store.get("is_deleting").is_some());
        assert!(store.get("is_authorized").is_some());
        assert_eq!(store.get("is_deleting").unwrap().value, false);
        assert_eq!(store.get("is_deleting").unwrap().default, false);
    }

    #[test]
    fn deactivate_then_activate_restores_named_subset() {
        let mut store = PredicateStore::new();
        store.insert_rule(PolicyKind::Action, "rule_a", "a");
        store.insert_rule(PolicyKind::Action, "rule_b", "b");
        store.deactivate_policies();
        assert!(store.action_policies().is_empty());
        store.activate_policy(&["rule_a".to_string()]);
        assert_eq!(store.action_policies().len(), 1);
        assert!(store.action_policies().contains_key("rule_a"));
    }

    #[test]
    fn apply_valuation_update_ignores_unknown_names() {
        let mut store = PredicateStore::new();
        store.insert_rule(PolicyKind::Action, "r", "a");
        store.apply_valuation_update("not_a_predicate", true);
        store.apply_valuation_update("a", true);
        assert_eq!(store.get("a").unwrap().value, true);
    }

    #[test]
    fn reset_message_policies_clears_prior_set() {
        let mut store = PredicateStore::new();
        store.insert_rule(PolicyKind::Message, "m1", "a");
        assert!(store.message_policies().is_some());
        store.reset_message_policies();
        assert!(store.message_policies().unwrap().is_empty());
    }
}
