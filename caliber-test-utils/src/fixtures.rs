//! Canned predicate/rule/policy fixtures shared across test suites,
//! lifted from spec.md §8's end-to-end scenarios so every crate's tests
//! exercise the same literal inputs.

use caliber_core::PredicateName;
use caliber_policy::{PolicyKind, PredicateStore};

/// An action-policy store with a vacuous rule that never blocks
/// anything (spec.md §8 scenario 3): `NOT is_deleting IMPLIES true`-style
/// rule over a single `false` predicate.
pub fn vacuous_action_policy_store() -> PredicateStore {
    let mut store = PredicateStore::new();
    store.insert_rule(PolicyKind::Action, "no_delete", "NOT is_deleting OR is_deleting");
    store.apply_valuation_update("is_deleting", false);
    store
}

/// An action-policy store that is violated by the current valuation
/// (spec.md §8 scenarios 4-5): `share_external IMPLIES is_authorized`
/// with `share_external=true, is_authorized=false`.
pub fn violated_action_policy_store() -> PredicateStore {
    let mut store = PredicateStore::new();
    store.insert_rule(PolicyKind::Action, "no_ext", "share_external IMPLIES is_authorized");
    store.apply_valuation_update("share_external", true);
    store.apply_valuation_update("is_authorized", false);
    store
}

/// A message-policy store violated by its valuation, with no action
/// policy installed — useful for `handle_message` tests.
pub fn violated_message_policy_store() -> PredicateStore {
    let mut store = PredicateStore::new();
    store.insert_rule(PolicyKind::Message, "no_ext_msg", "share_external IMPLIES is_authorized");
    store.apply_valuation_update("share_external", true);
    store.apply_valuation_update("is_authorized", false);
    store
}

pub fn predicate_name(name: &str) -> PredicateName {
    PredicateName::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliber_dsl::eval::eval;
    use caliber_dsl::parser::parse;

    #[test]
    fn vacuous_store_is_satisfied() {
        let store = vacuous_action_policy_store();
        let logic = store.action_policies().get("no_delete").unwrap();
        let expr = parse(logic).unwrap();
        assert!(eval(&expr, &store.full_valuation()).unwrap());
    }

    #[test]
    fn violated_store_is_unsatisfied() {
        let store = violated_action_policy_store();
        let logic = store.action_policies().get("no_ext").unwrap();
        let expr = parse(logic).unwrap();
        assert!(!eval(&expr, &store.full_valuation()).unwrap());
    }
}
