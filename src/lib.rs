//! Grammars grown incrementally from composable rules.
//!
//! A [`Grammar`] hands out named [`Rule`]s on first reference, so mutually
//! recursive rules need no forward declarations.  Each rule accumulates
//! alternative clauses at runtime: bare literals are classified into
//! whole-word or exact-text matches, left-recursive clauses are rewritten
//! into iteration, and clause semantics compose into one left-associative
//! reduction.  Reading input produces concrete-syntax text, which is then
//! bridged into the reference language's syntax tree.
//!
//! # Example
//!
//! ```rust
//! use gramsmith::{Grammar, Term, Value};
//!
//! let g = Grammar::new();
//! let num = g.rule("num");
//! let expr = g.rule("expr");
//!
//! // digits, one clause each
//! for d in ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"] {
//!     num.define([Term::from(d)]).unwrap();
//! }
//!
//! // a base case, then a left-recursive clause with explicit semantics
//! expr.define([Term::from(&num)]).unwrap();
//! expr.define_with(
//!     [Term::from(&expr), Term::from("+"), Term::from(&num)],
//!     |t| Value::Text(format!("(add {} {})", t[0], t[2])),
//! )
//! .unwrap();
//!
//! let node = expr.read("1 + 2 + 3").unwrap();
//! assert_eq!(node.to_string(), "(add (add 1 2) 3)");
//! ```

mod combinator;
mod error;
mod grammar;
mod matcher;
pub mod reference;
mod rule;

pub use combinator::{block_of, comma_list, list_of};
pub use error::Error;
pub use grammar::Grammar;
pub use matcher::{Matcher, RuleId, Semantics, Value, classify_literal, format_output};
pub use reference::{Node, ReferenceError, is_identifier, parse_text, render_node};
pub use rule::{Rule, Term};
