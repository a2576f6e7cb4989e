//! Rules: named grammar symbols that accumulate alternative clauses.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Error;
use crate::grammar::Store;
use crate::matcher::{Matcher, RuleId, Semantics, Value, classify_literal, engine};
use crate::reference::{self, Node};

/// One element of a clause being defined.
///
/// Bare literals are classified at append time: identifier-shaped strings
/// become whole-word keyword matches, everything else exact text.
#[derive(Debug, Clone)]
pub enum Term {
    /// A bare literal.
    Lit(String),
    /// A reference to another rule, or to the rule being defined.
    Ref(Rule),
    /// A pre-built matcher.
    Pat(Matcher),
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Lit(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Lit(s)
    }
}

impl From<&Rule> for Term {
    fn from(rule: &Rule) -> Self {
        Term::Ref(rule.clone())
    }
}

impl From<Rule> for Term {
    fn from(rule: Rule) -> Self {
        Term::Ref(rule)
    }
}

impl From<Matcher> for Term {
    fn from(m: Matcher) -> Self {
        Term::Pat(m)
    }
}

/// A named, self-referential grammar symbol.
///
/// A `Rule` is a cheap handle onto a clause-list cell owned by its
/// [`Grammar`](crate::Grammar); clones and repeated lookups denote the
/// same rule.  Clauses are appended with [`define`](Rule::define) or
/// [`define_with`](Rule::define_with); the composed matcher is the
/// longest-match choice over all clauses in append order, and every
/// matcher referencing this rule observes each new alternative
/// immediately.
#[derive(Clone)]
pub struct Rule {
    pub(crate) store: Arc<RwLock<Store>>,
    pub(crate) id: RuleId,
}

impl Rule {
    pub(crate) fn new(store: Arc<RwLock<Store>>, id: RuleId) -> Self {
        Self { store, id }
    }

    /// The rule's name, as registered in its grammar.
    pub fn name(&self) -> String {
        self.store_read().cell(self.id).name().to_string()
    }

    /// Number of clauses appended so far.
    pub fn clause_count(&self) -> usize {
        self.store_read().cell(self.id).clause_count()
    }

    /// Append one alternative with the default semantics: a single
    /// sub-result passes through, several are space-joined in match order.
    ///
    /// Returns the rule for chaining.  Fails with
    /// [`Error::MissingBaseCase`] if the clause is left-recursive and no
    /// prior clause exists.
    pub fn define<I>(&self, terms: I) -> Result<Rule, Error>
    where
        I: IntoIterator<Item = Term>,
    {
        self.append(terms.into_iter().collect(), Semantics::default())
    }

    /// Append one alternative with an explicit semantic action.
    pub fn define_with<I, F>(&self, terms: I, action: F) -> Result<Rule, Error>
    where
        I: IntoIterator<Item = Term>,
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.append(terms.into_iter().collect(), Semantics::new(action))
    }

    fn append(&self, terms: Vec<Term>, action: Semantics) -> Result<Rule, Error> {
        let mut store = self.store_write();

        let compile = |term: &Term| -> Matcher {
            match term {
                Term::Lit(text) => classify_literal(text),
                Term::Ref(rule) => {
                    assert!(
                        Arc::ptr_eq(&rule.store, &self.store),
                        "referenced rule belongs to a different grammar"
                    );
                    Matcher::Rule(rule.id)
                }
                Term::Pat(m) => m.clone(),
            }
        };

        let left_recursive = matches!(terms.first(), Some(Term::Ref(r)) if r == self);
        let clause = if left_recursive {
            // Rewrite `R -> R rest` as the matcher composed so far followed
            // by one-or-more grouped repetitions of `rest`, reduced
            // left-associatively through the clause action.
            let Some(base) = store.cell(self.id).matcher().cloned() else {
                return Err(Error::MissingBaseCase {
                    rule: store.cell(self.id).name().to_string(),
                });
            };
            let rest: Vec<Matcher> = terms[1..].iter().map(compile).collect();
            let step = Matcher::group(Matcher::Seq(rest));
            Matcher::seq(vec![base, Matcher::one_or_more(step)])
                .with_action(reduce_left(action))
        } else {
            let elems: Vec<Matcher> = terms.iter().map(compile).collect();
            Matcher::Seq(elems).with_action(action)
        };

        store.cell_mut(self.id).push_clause(clause);
        Ok(self.clone())
    }

    /// Apply this rule to `input`, requiring the entire input to be
    /// consumed, and bridge the concrete-syntax result into a
    /// reference-language node.
    pub fn read(&self, input: &str) -> Result<Node, Error> {
        self.read_impl(input, false)
    }

    /// Like [`read`](Rule::read), but prints the intermediate
    /// concrete-syntax text and the parsed node.
    pub fn read_verbose(&self, input: &str) -> Result<Node, Error> {
        self.read_impl(input, true)
    }

    fn read_impl(&self, input: &str, verbose: bool) -> Result<Node, Error> {
        let store = self.store_read();
        let cell = store.cell(self.id);
        let Some(matcher) = cell.matcher() else {
            return Err(Error::Syntax {
                position: 0,
                expected: vec![format!("<{}>", cell.name())],
            });
        };

        let toks = engine::parse_all(matcher, &store, input).map_err(|e| Error::Syntax {
            position: e.furthest,
            expected: e.expected,
        })?;
        let value = match toks.into_iter().next() {
            Some(v) => v,
            None => Value::Text(String::new()),
        };

        let text = value.to_string();
        if verbose {
            println!("concrete syntax: {text}");
        }
        let node = reference::parse_text(&text).map_err(|source| Error::Semantics {
            rule: cell.name().to_string(),
            text: text.clone(),
            source,
        })?;
        if verbose {
            println!("reference tree: {node}");
        }
        Ok(node)
    }

    fn store_read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().expect("grammar store poisoned")
    }

    fn store_write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().expect("grammar store poisoned")
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store) && self.id == other.id
    }
}

impl Eq for Rule {}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store.try_read() {
            Ok(store) => write!(f, "Rule({})", store.cell(self.id).name()),
            Err(_) => write!(f, "Rule(#{})", self.id.0),
        }
    }
}

/// Left-associative reduction for rewritten left-recursive clauses: fold
/// each repetition's grouped sub-results into the accumulator through the
/// clause action.
fn reduce_left(action: Semantics) -> Semantics {
    Semantics::new(move |toks| {
        let mut steps = toks.iter();
        let Some(first) = steps.next() else {
            return Value::Text(String::new());
        };
        let mut acc = first.clone();
        for step in steps {
            let mut args = vec![acc];
            match step {
                Value::Group(sub) => args.extend(sub.iter().cloned()),
                other => args.push(other.clone()),
            }
            acc = action.apply(&args);
        }
        acc
    })
}
