//! Policy Verifier (C5, spec.md §4.4), grounded on
//! `quadsentinel/agents/verifier.py`'s `PolicyVerifier.on_message`: apply
//! the logic evaluator across every active rule in insertion order and
//! collect which ones evaluated false.
//!
//! Unlike the source (which re-sorts predicates by name length to fake
//! longest-match substitution), this verifier relies on the real
//! tokenizing parser in `caliber-dsl` for that guarantee and evaluates
//! rules in the policy map's insertion order directly.

use caliber_dsl::eval::{eval, Valuation};
use crate::store::PolicySet;

/// The result of verifying a policy set against a valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: bool,
    pub violated: Vec<String>,
}

/// Evaluate every rule in `policies` against `valuation`. An empty
/// policy set returns `{decision: true, violated: []}` (spec.md §4.4).
///
/// A rule that fails to parse or references an unresolved identifier is
/// skipped with the rule treated as non-violating (spec.md §7
/// `InvalidRule` "fail-open on that single rule"); the caller should log
/// a warning via the returned parse errors.
pub fn verify(policies: &PolicySet, valuation: &Valuation) -> (Verdict, Vec<(String, caliber_core::LogicError)>) {
    let mut violated = Vec::new();
    let mut errors = Vec::new();
    for (name, logic) in policies {
        match caliber_dsl::parser::parse(logic) {
            Ok(expr) => match eval(&expr, valuation) {
                Ok(true) => {}
                Ok(false) => violated.push(name.clone()),
                Err(e) => errors.push((name.clone(), e)),
            },
            Err(e) => errors.push((name.clone(), e)),
        }
    }
    let decision = violated.is_empty();
    (Verdict { decision, violated }, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliber_core::PredicateName;

    fn valuation(pairs: &[(&str, bool)]) -> Valuation {
        pairs
            .iter()
            .map(|(k, v)| (PredicateName::from(*k), *v))
            .collect()
    }

    #[test]
    fn empty_policy_set_is_vacuously_true() {
        let policies = PolicySet::new();
        let (verdict, errors) = verify(&policies, &Valuation::new());
        assert!(verdict.decision);
        assert!(verdict.violated.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn collects_every_violated_rule_in_insertion_order() {
        let mut policies = PolicySet::new();
        policies.insert("no_ext".to_string(), "share_external IMPLIES is_authorized".to_string());
        policies.insert("no_delete".to_string(), "NOT is_deleting".to_string());
        let v = valuation(&[
            ("share_external", true),
            ("is_authorized", false),
            ("is_deleting", true),
        ]);
        let (verdict, errors) = verify(&policies, &v);
        assert!(!verdict.decision);
        assert_eq!(verdict.violated, vec!["no_ext".to_string(), "no_delete".to_string()]);
        assert!(errors.is_empty());
    }

    #[test]
    fn single_satisfied_rule_is_not_violated() {
        let mut policies = PolicySet::new();
        policies.insert("no_delete".to_string(), "NOT is_deleting OR is_deleting".to_string());
        let v = valuation(&[("is_deleting", false)]);
        let (verdict, _) = verify(&policies, &v);
        assert!(verdict.decision);
    }

    #[test]
    fn unresolved_identifier_is_reported_as_an_error_not_a_violation() {
        let mut policies = PolicySet::new();
        policies.insert("broken".to_string(), "not_in_valuation".to_string());
        let (verdict, errors) = verify(&policies, &Valuation::new());
        assert!(verdict.decision);
        assert_eq!(errors.len(), 1);
    }

    proptest::proptest! {
        #[test]
        fn single_rule_verdict_always_matches_direct_eval(a: bool, b: bool) {
            let mut policies = PolicySet::new();
            policies.insert("rule".to_string(), "a IMPLIES b".to_string());
            let v = valuation(&[("a", a), ("b", b)]);
            let (verdict, errors) = verify(&policies, &v);
            proptest::prop_assert!(errors.is_empty());
            let expr = caliber_dsl::parser::parse("a IMPLIES b").unwrap();
            let expected = eval(&expr, &v).unwrap();
            proptest::prop_assert_eq!(verdict.decision, expected);
        }
    }
}
