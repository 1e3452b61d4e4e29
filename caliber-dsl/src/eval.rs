//! Pure evaluator for propositional-logic expressions (C2).
//!
//! Evaluation never consults external state; it only reads the
//! [`Valuation`] passed in. `A IMPLIES B` is evaluated as
//! `(NOT A) OR B`, matching spec.md §4.1.

use crate::ast::Expr;
use caliber_core::{LogicError, PredicateName};
use std::collections::BTreeMap;

/// A snapshot of predicate name -> current boolean value.
pub type Valuation = BTreeMap<PredicateName, bool>;

/// Evaluate `expr` against `valuation`. Every identifier referenced by
/// `expr` must be present in `valuation`, or [`LogicError::UnresolvedIdentifier`]
/// is returned — callers are expected to have auto-created missing
/// predicates (spec.md §3) before calling this.
pub fn eval(expr: &Expr, valuation: &Valuation) -> Result<bool, LogicError> {
    match expr {
        Expr::Literal(name) => valuation
            .get(name.as_str())
            .copied()
            .ok_or_else(|| LogicError::UnresolvedIdentifier { name: name.clone() }),
        Expr::Not(inner) => Ok(!eval(inner, valuation)?),
        Expr::And(l, r) => Ok(eval(l, valuation)? && eval(r, valuation)?),
        Expr::Or(l, r) => Ok(eval(l, valuation)? || eval(r, valuation)?),
        Expr::Implies(l, r) => Ok(!eval(l, valuation)? || eval(r, valuation)?),
    }
}

/// Parse and evaluate `logic` in one step.
pub fn parse_and_eval(logic: &str, valuation: &Valuation) -> Result<bool, LogicError> {
    let expr = crate::parser::parse(logic)?;
    eval(&expr, valuation)
}
