//! # CNF primitives
//! Boolean variables, clauses and formulas, plus the DIMACS serialization the external
//! solver consumes ([dimacs]).
//!
//! Every [Variable] carries the semantic role it plays in the encoding ([VarRole]), so a
//! satisfying model can be mapped straight back into DFA structure by matching on the role.
//! Variables are interned by name in a [VarPool]: two requests for the same name yield the
//! same `Rc`, which makes name equality and pointer equality coincide and lets a variable's
//! assignment slot be filled in once, after solving, for every clause holding it.
//!
//! ```
//! use dfasat::cnf::{Clause, Formula, VarPool, VarRole};
//!
//! let mut pool: VarPool<char> = VarPool::new();
//! let x = pool.intern(VarRole::NodeColor { node: 3, color: 1 });
//! let z = pool.intern(VarRole::AcceptingColor { color: 1 });
//!
//! let mut formula = Formula::new();
//! formula.push(Clause::new().negative(x.clone()).positive(z.clone()));
//! formula.push(Clause::new().positive(x.clone()));
//!
//! assert_eq!(formula.len(), 2);
//! assert_eq!(pool.intern(VarRole::NodeColor { node: 3, color: 1 }), x);
//! ```

use crate::graph::{Label, NodeId};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub mod dimacs;

pub use dimacs::VarMap;

/// The semantic role of a Boolean variable in the identification encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarRole<L: Label> {
    /// `x(v,i)`: APTA node `v` is colored `i`.
    NodeColor { node: NodeId, color: usize },
    /// `x(v,i)` for the APTA root: same Boolean meaning as [VarRole::NodeColor], but the
    /// distinguished role tells reconstruction which color is the initial DFA state.
    InitialNodeColor { node: NodeId, color: usize },
    /// `y(a,i,j)`: in the DFA, the transition from color `i` on label `a` leads to `j`.
    Transition {
        label: L,
        source: usize,
        target: usize,
    },
    /// `z(i)`: color `i` is an accepting DFA state.
    AcceptingColor { color: usize },
}

impl<L: Label> fmt::Display for VarRole<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarRole::NodeColor { node, color } => write!(f, "x({node},{color})"),
            VarRole::InitialNodeColor { node, color } => write!(f, "x_init({node},{color})"),
            VarRole::Transition {
                label,
                source,
                target,
            } => write!(f, "y({label},{source},{target})"),
            VarRole::AcceptingColor { color } => write!(f, "z({color})"),
        }
    }
}

/// A named Boolean variable with a role and a mutable assignment slot.
///
/// Identity is the name: the [VarPool] guarantees one allocation per name, and equality and
/// hashing go through the name alone.
#[derive(Debug)]
pub struct Variable<L: Label> {
    name: Rc<str>,
    role: VarRole<L>,
    assigned: Cell<bool>,
}

impl<L: Label> Variable<L> {
    /// The unique name, derived from the role.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The semantic role.
    pub fn role(&self) -> &VarRole<L> {
        &self.role
    }

    /// The assignment slot. `false` until a satisfying model set it.
    pub fn assigned(&self) -> bool {
        self.assigned.get()
    }

    /// Fills the assignment slot from a model.
    pub fn assign(&self, value: bool) {
        self.assigned.set(value);
    }
}

impl<L: Label> PartialEq for Variable<L> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<L: Label> Eq for Variable<L> {}

impl<L: Label> Hash for Variable<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<L: Label> fmt::Display for Variable<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Intern table mapping variable names to their unique allocation.
#[derive(Debug)]
pub struct VarPool<L: Label> {
    vars: HashMap<Rc<str>, Rc<Variable<L>>>,
}

impl<L: Label> Default for VarPool<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> VarPool<L> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        VarPool {
            vars: HashMap::new(),
        }
    }

    /// Returns the variable with the given role, allocating it on first request. Two
    /// requests with the same role (hence the same name) return the same `Rc`.
    pub fn intern(&mut self, role: VarRole<L>) -> Rc<Variable<L>> {
        let name: Rc<str> = Rc::from(role.to_string().as_str());
        match self.vars.get(&name) {
            Some(var) => var.clone(),
            None => {
                let var = Rc::new(Variable {
                    name: name.clone(),
                    role,
                    assigned: Cell::new(false),
                });
                self.vars.insert(name, var.clone());
                var
            }
        }
    }

    /// Looks a variable up by name.
    pub fn get(&self, name: &str) -> Option<&Rc<Variable<L>>> {
        self.vars.get(name)
    }

    /// The number of interned variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Checks whether no variable was interned yet.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A disjunction of literals, stored as one list per polarity.
///
/// Adding a variable twice on the same polarity is a no-op. A variable on both polarities
/// makes the clause trivially satisfied; the clause is kept as-is since the solver absorbs
/// tautologies.
#[derive(Debug, Clone)]
pub struct Clause<L: Label> {
    positives: Vec<Rc<Variable<L>>>,
    negatives: Vec<Rc<Variable<L>>>,
}

impl<L: Label> Default for Clause<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> Clause<L> {
    /// Creates an empty clause. An empty clause is unsatisfiable.
    pub fn new() -> Self {
        Clause {
            positives: Vec::new(),
            negatives: Vec::new(),
        }
    }

    /// Adds a positive literal, consuming and returning the clause for chaining.
    pub fn positive(mut self, var: Rc<Variable<L>>) -> Self {
        self.push_positive(var);
        self
    }

    /// Adds a negated literal, consuming and returning the clause for chaining.
    pub fn negative(mut self, var: Rc<Variable<L>>) -> Self {
        self.push_negative(var);
        self
    }

    /// Adds a positive literal in place.
    pub fn push_positive(&mut self, var: Rc<Variable<L>>) {
        if !self.positives.contains(&var) {
            self.positives.push(var);
        }
    }

    /// Adds a negated literal in place.
    pub fn push_negative(&mut self, var: Rc<Variable<L>>) {
        if !self.negatives.contains(&var) {
            self.negatives.push(var);
        }
    }

    /// The positive literals.
    pub fn positives(&self) -> &[Rc<Variable<L>>] {
        &self.positives
    }

    /// The negated literals.
    pub fn negatives(&self) -> &[Rc<Variable<L>>] {
        &self.negatives
    }

    /// The number of literals.
    pub fn width(&self) -> usize {
        self.positives.len() + self.negatives.len()
    }

    /// Checks whether the clause has no literals at all.
    pub fn is_empty(&self) -> bool {
        self.positives.is_empty() && self.negatives.is_empty()
    }

    /// Checks whether some variable appears on both polarities.
    pub fn is_tautology(&self) -> bool {
        self.positives.iter().any(|v| self.negatives.contains(v))
    }
}

/// A conjunction of clauses.
#[derive(Debug, Clone)]
pub struct Formula<L: Label> {
    clauses: Vec<Clause<L>>,
}

impl<L: Label> Default for Formula<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> Formula<L> {
    /// Creates an empty formula. An empty formula is trivially satisfiable.
    pub fn new() -> Self {
        Formula {
            clauses: Vec::new(),
        }
    }

    /// Appends a clause.
    pub fn push(&mut self, clause: Clause<L>) {
        self.clauses.push(clause);
    }

    /// The clauses, in insertion order.
    pub fn clauses(&self) -> &[Clause<L>] {
        &self.clauses
    }

    /// The number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Checks whether the formula has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Checks whether some clause is empty, making the whole formula a trivial
    /// contradiction no solver needs to look at.
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    /// The number of distinct variables mentioned by the clauses.
    pub fn distinct_variables(&self) -> usize {
        let mut names = std::collections::HashSet::new();
        for clause in &self.clauses {
            for var in clause.positives().iter().chain(clause.negatives()) {
                names.insert(var.name.clone());
            }
        }
        names.len()
    }

    /// The width of the widest clause, or 0 for an empty formula.
    pub fn max_width(&self) -> usize {
        self.clauses.iter().map(Clause::width).max().unwrap_or(0)
    }
}
