//! The grammar registry: a named collection of rules with lazy creation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::matcher::{Matcher, RuleId};
use crate::rule::Rule;

/// One rule's mutable state: its clause matchers and the matcher composed
/// from them.  Owned by the store; rules and rule references hold only the
/// cell's id.
#[derive(Debug, Default)]
pub(crate) struct RuleCell {
    name: String,
    clauses: Vec<Matcher>,
    composed: Option<Matcher>,
}

impl RuleCell {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// The composed matcher, or `None` while no clause has been appended.
    pub(crate) fn matcher(&self) -> Option<&Matcher> {
        self.composed.as_ref()
    }

    pub(crate) fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Append a clause matcher and recompose: a single clause stands
    /// alone, several become a longest-match choice in append order.
    pub(crate) fn push_clause(&mut self, clause: Matcher) {
        self.clauses.push(clause);
        self.composed = Some(if self.clauses.len() == 1 {
            self.clauses[0].clone()
        } else {
            Matcher::Choice(self.clauses.clone())
        });
    }
}

/// Backing storage for a grammar's rules.  Cells are created on first
/// reference and never removed; names can be rebound (`Grammar::set`)
/// without disturbing matchers compiled against the old cell.
#[derive(Debug, Default)]
pub(crate) struct Store {
    names: HashMap<String, RuleId>,
    cells: Vec<RuleCell>,
}

impl Store {
    pub(crate) fn cell(&self, id: RuleId) -> &RuleCell {
        &self.cells[id.0]
    }

    pub(crate) fn cell_mut(&mut self, id: RuleId) -> &mut RuleCell {
        &mut self.cells[id.0]
    }

    pub(crate) fn create(&mut self, name: &str) -> RuleId {
        let id = RuleId(self.cells.len());
        self.cells.push(RuleCell {
            name: name.to_string(),
            ..RuleCell::default()
        });
        id
    }
}

/// A named collection of [`Rule`]s with auto-vivifying lookup.
///
/// Looking up a name that has no rule yet creates an empty one, so
/// mutually recursive rules can reference each other before either is
/// defined.  One `Grammar` per language being defined; cloning yields
/// another handle onto the same registry.
#[derive(Clone, Default)]
pub struct Grammar {
    store: Arc<RwLock<Store>>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `name`, creating an empty rule on first reference.
    /// Repeated lookups return the same rule.
    pub fn rule(&self, name: &str) -> Rule {
        let mut store = self.write();
        let id = match store.names.get(name) {
            Some(&id) => id,
            None => {
                let id = store.create(name);
                store.names.insert(name.to_string(), id);
                id
            }
        };
        Rule::new(Arc::clone(&self.store), id)
    }

    /// Rebind `name` to `rule`, discarding the old binding outright.
    ///
    /// Matchers compiled against the old rule keep their old meaning;
    /// only future lookups of `name` see the replacement.
    ///
    /// # Panics
    ///
    /// Panics if `rule` belongs to a different grammar.
    pub fn set(&self, name: &str, rule: &Rule) {
        assert!(
            Arc::ptr_eq(&self.store, &rule.store),
            "rule belongs to a different grammar"
        );
        self.write().names.insert(name.to_string(), rule.id);
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().expect("grammar store poisoned")
    }
}
