//! Matcher tree types and semantic-action plumbing.

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::reference::{self, Node};

/// Identifier of a rule cell inside its grammar's store.
///
/// Every reference to a rule compiles to the same stable id; the mutable
/// clause list lives in the store and is looked up at match time, which is
/// what lets a rule be referenced before it is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) usize);

/// A token value flowing through matchers and semantic actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Concrete-syntax text.
    Text(String),
    /// An already-parsed reference node; renders via the reference printer.
    Node(Node),
    /// One grouped repetition's sub-results (left-recursion steps).
    Group(Vec<Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// The reference node inside, if this value is one.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Node(node) => write!(f, "{node}"),
            Value::Group(items) => write!(f, "{}", items.iter().format(" ")),
        }
    }
}

/// A semantic action: collapses a clause's matched sub-results into one
/// value.  Cheap to clone; safe to share across threads.
#[derive(Clone)]
pub struct Semantics(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl Semantics {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, toks: &[Value]) -> Value {
        (self.0)(toks)
    }
}

impl Default for Semantics {
    /// The default clause semantics: a single sub-result passes through
    /// unchanged (preserving reference nodes), several are rendered and
    /// joined with single spaces in match order.
    fn default() -> Self {
        Self::new(|toks| match toks {
            [single] => single.clone(),
            many => Value::Text(many.iter().map(|t| t.to_string()).join(" ")),
        })
    }
}

impl fmt::Debug for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Semantics(..)")
    }
}

/// A composable matcher over input text.
///
/// Terminals skip leading whitespace; composites combine the sub-results
/// of their children.  See the module docs for the full table.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact text (operators, punctuation).
    Exact(String),
    /// Whole-word match; never succeeds as part of a longer identifier.
    Keyword(String),
    /// Children in order.
    Seq(Vec<Matcher>),
    /// Longest-match choice; ties go to the earliest alternative.
    Choice(Vec<Matcher>),
    /// Greedy repetition of `inner`: at least `min`, at most `max`.
    Repeat {
        inner: Box<Matcher>,
        min: usize,
        max: Option<usize>,
    },
    /// Wraps the sub-results of `inner` into one [`Value::Group`].
    Group(Box<Matcher>),
    /// Matches `inner` and discards its sub-results.
    Suppress(Box<Matcher>),
    /// Deferred reference to a rule cell, resolved at match time.
    Rule(RuleId),
    /// One-or-more `inner` at a uniform indentation column deeper than the
    /// line the block starts on; re-serializes to one multi-line token.
    Block(Box<Matcher>),
    /// Collapses the sub-results of `inner` through a semantic action.
    Action {
        inner: Box<Matcher>,
        action: Semantics,
    },
}

impl Matcher {
    pub fn seq(items: Vec<Matcher>) -> Self {
        Matcher::Seq(items)
    }

    pub fn choice(alts: Vec<Matcher>) -> Self {
        Matcher::Choice(alts)
    }

    pub fn zero_or_more(inner: Matcher) -> Self {
        Matcher::Repeat {
            inner: Box::new(inner),
            min: 0,
            max: None,
        }
    }

    pub fn one_or_more(inner: Matcher) -> Self {
        Matcher::Repeat {
            inner: Box::new(inner),
            min: 1,
            max: None,
        }
    }

    pub fn optional(inner: Matcher) -> Self {
        Matcher::Repeat {
            inner: Box::new(inner),
            min: 0,
            max: Some(1),
        }
    }

    pub fn group(inner: Matcher) -> Self {
        Matcher::Group(Box::new(inner))
    }

    pub fn suppress(inner: Matcher) -> Self {
        Matcher::Suppress(Box::new(inner))
    }

    pub fn with_action(self, action: Semantics) -> Self {
        Matcher::Action {
            inner: Box::new(self),
            action,
        }
    }
}

/// Compile a bare literal: identifier-shaped strings become whole-word
/// keyword matches, everything else matches exact text.
pub fn classify_literal(text: &str) -> Matcher {
    if reference::is_identifier(text) {
        Matcher::Keyword(text.to_string())
    } else {
        Matcher::Exact(text.to_string())
    }
}

/// Build a semantic action from a template string.
///
/// `{}` substitutes the next sub-result's rendered form, `{N}` the N-th
/// (0-based), `{{` and `}}` are literal braces.
///
/// ```rust
/// use gramsmith::{Value, format_output};
///
/// let f = format_output("({1} {0})");
/// let toks = [Value::text("a"), Value::text("b")];
/// assert_eq!(f(&toks), Value::text("(b a)"));
/// ```
pub fn format_output(template: &str) -> impl Fn(&[Value]) -> Value + Send + Sync + 'static {
    let template = template.to_string();
    move |toks: &[Value]| {
        let mut out = String::new();
        let mut next = 0usize;
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut spec = String::new();
                    while let Some(&d) = chars.peek() {
                        if d == '}' {
                            break;
                        }
                        spec.push(d);
                        chars.next();
                    }
                    chars.next(); // consume '}'
                    let idx = if spec.is_empty() {
                        let i = next;
                        next += 1;
                        i
                    } else {
                        spec.parse().unwrap_or(usize::MAX)
                    };
                    if let Some(v) = toks.get(idx) {
                        out.push_str(&v.to_string());
                    }
                }
                _ => out.push(c),
            }
        }
        Value::Text(out)
    }
}
