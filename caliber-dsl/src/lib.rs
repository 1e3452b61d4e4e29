//! Propositional-logic lexer, parser, and evaluator for the CALIBER
//! guard's rule expressions (C2, spec.md §4.1).

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::Expr;
pub use eval::{eval as eval_expr, parse_and_eval, Valuation};
pub use lexer::{tokenize, Token};
pub use parser::parse;
