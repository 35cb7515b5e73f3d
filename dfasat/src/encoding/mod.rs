//! # Identification problem encoding
//! Turns "merge the APTA states into a DFA of k states" into CNF, following Heule and
//! Verwer's graph-coloring formulation. Colors 0..k stand for DFA states; the variables are
//! the tagged family of [VarRole](crate::cnf::VarRole):
//!
//! * `x(v,i)`: APTA node v gets color i (the root's slots carry the initial-state role);
//! * `y(a,i,j)`: the DFA steps from color i to color j on label a;
//! * `z(i)`: color i is accepting.
//!
//! The *basic* clause set is sufficient for correctness. The *redundant* set (emitted
//! unless [EncodingOptions::minimal]) prunes the search and forces the y-variables to carry
//! a complete transition function, at the price of a larger formula. Both are specified in
//! the match arms of [encode].

use crate::apta::{Apta, Response};
use crate::cnf::{Clause, Formula, VarPool, VarRole, Variable};
use crate::constraints::ConstraintsGraph;
use crate::graph::{Label, NodeId};
use log::debug;
use std::rc::Rc;
use thiserror::Error;

/// Choices for [encode].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingOptions {
    /// Emit only the minimal-sufficient clause set, skipping the redundant clauses. The
    /// reconstructed DFA may then have a partial transition function.
    pub minimal: bool,
}

/// Rejections of ill-formed [encode] inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The constraints graph was not derived from the APTA it was handed in with.
    #[error("constraints graph does not belong to this APTA ({graph_nodes} nodes with differing responses, APTA has {apta_nodes})")]
    ForeignConstraints {
        apta_nodes: usize,
        graph_nodes: usize,
    },
    /// Fewer colors than clique members: the clique seeding could not even be written down.
    #[error("cannot color a clique of {clique} pairwise-conflicting states with {colors} colors")]
    TooFewColors { colors: usize, clique: usize },
}

/// A CNF encoding of the k-coloring problem for one fixed color count.
#[derive(Debug)]
pub struct Encoding<L: Label> {
    formula: Formula<L>,
    colors: usize,
    variables: usize,
}

impl<L: Label> Encoding<L> {
    /// The generated formula.
    pub fn formula(&self) -> &Formula<L> {
        &self.formula
    }

    /// The color count the encoding was generated for.
    pub fn colors(&self) -> usize {
        self.colors
    }

    /// The number of distinct variables allocated.
    pub fn variables(&self) -> usize {
        self.variables
    }

    /// The number of clauses.
    pub fn clauses(&self) -> usize {
        self.formula.len()
    }
}

/// Generates the CNF encoding for coloring `apta` with `colors` colors, seeded by `clique`.
///
/// The constraints graph must have been derived from the very same APTA, and `colors` must
/// be at least the clique size; both are checked.
pub fn encode<L: Label>(
    apta: &Apta<L>,
    graph: &ConstraintsGraph,
    clique: &[NodeId],
    colors: usize,
    options: &EncodingOptions,
) -> Result<Encoding<L>, EncodingError> {
    if graph.len() != apta.len()
        || apta.nodes().any(|id| graph.response(id) != apta.response(id))
    {
        return Err(EncodingError::ForeignConstraints {
            apta_nodes: apta.len(),
            graph_nodes: graph.len(),
        });
    }
    if colors < clique.len() {
        return Err(EncodingError::TooFewColors {
            colors,
            clique: clique.len(),
        });
    }

    let mut enc = Encoder {
        pool: VarPool::new(),
        formula: Formula::new(),
        root: apta.root(),
        colors,
    };
    let alphabet = apta.alphabet();
    let accepting = graph.of_response(Response::Accept);
    let rejecting = graph.of_response(Response::Reject);

    // clique seeding: the s-th clique member is pinned to color s
    for (s, &member) in clique.iter().enumerate() {
        let x = enc.x(member, s);
        enc.unit(x);
        let z = enc.z(s);
        match graph.response(member) {
            Response::Accept => enc.unit(z),
            Response::Reject => enc.unit_negated(z),
            Response::Unknown => {}
        }
    }

    // every node wears at least one color
    for v in apta.nodes() {
        let mut clause = Clause::new();
        for i in 0..colors {
            clause.push_positive(enc.x(v, i));
        }
        enc.formula.push(clause);
    }

    // a color shared with an accepting node is accepting, with a rejecting one is not
    for i in 0..colors {
        for &u in &accepting {
            let clause = Clause::new().negative(enc.x(u, i)).positive(enc.z(i));
            enc.formula.push(clause);
        }
        for &w in &rejecting {
            let clause = Clause::new().negative(enc.x(w, i)).negative(enc.z(i));
            enc.formula.push(clause);
        }
    }

    // a colored parent-child pair implies the corresponding transition
    for v in apta.nodes() {
        let Some((p, a)) = apta.parent(v).cloned() else {
            continue;
        };
        for i in 0..colors {
            for j in 0..colors {
                let clause = Clause::new()
                    .positive(enc.y(a.clone(), i, j))
                    .negative(enc.x(p, i))
                    .negative(enc.x(v, j));
                enc.formula.push(clause);
            }
        }
    }

    // transitions are deterministic and total in the target color
    for a in &alphabet {
        for i in 0..colors {
            for j in 0..colors {
                for h in 0..j {
                    let clause = Clause::new()
                        .negative(enc.y(a.clone(), i, h))
                        .negative(enc.y(a.clone(), i, j));
                    enc.formula.push(clause);
                }
            }
            let mut clause = Clause::new();
            for j in 0..colors {
                clause.push_positive(enc.y(a.clone(), i, j));
            }
            enc.formula.push(clause);
        }
    }

    if !options.minimal {
        // at most one color per node
        for v in apta.nodes() {
            for j in 0..colors {
                for i in 0..j {
                    let clause = Clause::new().negative(enc.x(v, i)).negative(enc.x(v, j));
                    enc.formula.push(clause);
                }
            }
        }

        // a transition taken by the parent forces the child's color
        for v in apta.nodes() {
            let Some((p, a)) = apta.parent(v).cloned() else {
                continue;
            };
            for i in 0..colors {
                for j in 0..colors {
                    let clause = Clause::new()
                        .negative(enc.y(a.clone(), i, j))
                        .negative(enc.x(p, i))
                        .positive(enc.x(v, j));
                    enc.formula.push(clause);
                }
            }
        }

        // conflicting nodes never share a color
        for (u, v) in graph.constraints() {
            for i in 0..colors {
                let clause = Clause::new().negative(enc.x(u, i)).negative(enc.x(v, i));
                enc.formula.push(clause);
            }
        }
    }

    let encoding = Encoding {
        variables: enc.pool.len(),
        formula: enc.formula,
        colors,
    };
    debug!(
        "encoded {} colors: {} variables, {} clauses{}",
        colors,
        encoding.variables,
        encoding.clauses(),
        if options.minimal { " (minimal)" } else { "" }
    );
    Ok(encoding)
}

struct Encoder<L: Label> {
    pool: VarPool<L>,
    formula: Formula<L>,
    root: NodeId,
    colors: usize,
}

impl<L: Label> Encoder<L> {
    /// `x(v,i)`, with the initial-state role on the root's slots.
    fn x(&mut self, node: NodeId, color: usize) -> Rc<Variable<L>> {
        debug_assert!(color < self.colors);
        let role = if node == self.root {
            VarRole::InitialNodeColor { node, color }
        } else {
            VarRole::NodeColor { node, color }
        };
        self.pool.intern(role)
    }

    fn y(&mut self, label: L, source: usize, target: usize) -> Rc<Variable<L>> {
        self.pool.intern(VarRole::Transition {
            label,
            source,
            target,
        })
    }

    fn z(&mut self, color: usize) -> Rc<Variable<L>> {
        self.pool.intern(VarRole::AcceptingColor { color })
    }

    fn unit(&mut self, var: Rc<Variable<L>>) {
        self.formula.push(Clause::new().positive(var));
    }

    fn unit_negated(&mut self, var: Rc<Variable<L>>) {
        self.formula.push(Clause::new().negative(var));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apta::graphemes;

    fn toy() -> (Apta<Rc<str>>, ConstraintsGraph, Vec<NodeId>) {
        let mut apta = Apta::new();
        apta.accept(&graphemes("a"));
        apta.reject(&graphemes("b"));
        let graph = ConstraintsGraph::from_apta(&apta);
        let clique = graph.clique();
        (apta, graph, clique)
    }

    #[test]
    fn rejects_too_few_colors() {
        let (apta, graph, clique) = toy();
        let err = encode(&apta, &graph, &clique, clique.len() - 1, &EncodingOptions::default())
            .unwrap_err();
        assert!(matches!(err, EncodingError::TooFewColors { .. }));
    }

    #[test]
    fn rejects_a_foreign_constraints_graph() {
        let (apta, _, _) = toy();
        let mut other = Apta::new();
        other.accept(&graphemes("xyz"));
        other.reject(&graphemes("x"));
        let foreign = ConstraintsGraph::from_apta(&other);
        let err = encode(&apta, &foreign, &[], 2, &EncodingOptions::default()).unwrap_err();
        assert!(matches!(err, EncodingError::ForeignConstraints { .. }));
    }

    #[test]
    fn minimal_encoding_is_smaller() {
        let (apta, graph, clique) = toy();
        let full = encode(&apta, &graph, &clique, 2, &EncodingOptions::default()).unwrap();
        let minimal =
            encode(&apta, &graph, &clique, 2, &EncodingOptions { minimal: true }).unwrap();
        assert!(minimal.clauses() < full.clauses());
        assert_eq!(minimal.colors(), full.colors());
    }

    #[test]
    fn root_color_slots_carry_the_initial_role() {
        let (apta, graph, clique) = toy();
        let encoding = encode(&apta, &graph, &clique, 2, &EncodingOptions::default()).unwrap();
        let mut initial_slots = 0;
        let mut seen = std::collections::HashSet::new();
        for clause in encoding.formula().clauses() {
            for var in clause.positives().iter().chain(clause.negatives()) {
                if !seen.insert(var.name().to_string()) {
                    continue;
                }
                if let VarRole::InitialNodeColor { node, .. } = var.role() {
                    assert_eq!(*node, apta.root());
                    initial_slots += 1;
                }
            }
        }
        assert_eq!(initial_slots, encoding.colors());
    }
}
