//!# dfasat
//!
//! `dfasat` learns the smallest deterministic finite automaton consistent with a collection
//! of example traces, some labeled as *accepted* and some as *rejected*, by exact reduction
//! to Boolean satisfiability in the style of Heule and Verwer.
//!
//! ## Pipeline
//!
//! The identification runs in four stages, each its own module:
//!
//! 1. The traces are folded into an [Augmented Prefix Tree Acceptor](apta::Apta): a
//!    deterministic prefix tree whose nodes carry an Accept/Reject/Unknown response.
//! 2. A [constraints graph](constraints::ConstraintsGraph) over the tree's nodes records
//!    every pair of states that can never be merged into one DFA state, and a greedy
//!    [clique](constraints::ConstraintsGraph::clique) of it lower-bounds the state count.
//! 3. For one candidate state count k, [encoding](encoding::encode) emits a CNF formula
//!    whose models are exactly the consistent ways of coloring the tree with k colors.
//! 4. The [solver bridge](solver) hands the formula to an external SAT solver as a DIMACS
//!    file and [folds a satisfying model back](solver::reconstruct) into a [Dfa](dfa::Dfa).
//!
//! The [identification loop](identify::identify) ties the stages together, trying k from
//! the clique size upward until the first satisfiable encoding.
//!
//! ## Usage
//!
//! ```no_run
//! use dfasat::apta::Apta;
//! use dfasat::identify::{identify, IdentifyOptions};
//! use dfasat::solver::ProcessSolver;
//! use std::time::Duration;
//!
//! // A toy sample: strings over {c, i, a, o, r}
//! let mut apta = Apta::new();
//! for word in ["ciao", "ci", "ca", ""] {
//!     apta.accept_graphemes(word);
//! }
//! apta.reject_graphemes("ciar");
//!
//! // Any solver speaking the DIMACS competition format will do
//! let oracle = ProcessSolver::new("picosat", Duration::from_secs(3600));
//! let identification = identify(&apta, &oracle, &IdentifyOptions::default()).unwrap();
//!
//! let dfa = &identification.dfa;
//! assert_eq!(dfa.parse_graphemes("ciao", true), Ok(true));
//! assert_eq!(dfa.parse_graphemes("ciar", true), Ok(false));
//! println!("{}", dfa.to_table());
//! ```
//!
//! ## External solver
//!
//! The SAT oracle is consumed through the narrow [solver::Oracle] trait: a function from a
//! DIMACS CNF file to a satisfiable/unsatisfiable verdict. [solver::ProcessSolver] invokes
//! any solver executable that prints the standard `s`/`v` output lines (`picosat` does by
//! default, `glucose` and friends with their model flag). Re-targeting the pipeline to a
//! different solver means swapping this single collaborator.
//!
//! ## Operations
//!
//! This library currently supports:
//!
//! * Building an [APTA](apta::Apta) from labeled traces, with grapheme-cluster splitting
//!   for string samples
//! * Deriving the [merge-inconsistency graph](constraints::ConstraintsGraph) with direct
//!   and indirect conflicts, and extracting a greedy clique lower bound
//! * Emitting the k-coloring CNF [encoding](encoding::encode), minimal or with the
//!   redundant pruning clauses
//! * [DIMACS serialization](cnf::dimacs) with a stable two-way variable/id mapping
//! * Driving an external solver with a timeout and [reconstructing](solver::reconstruct)
//!   the learned [Dfa](dfa::Dfa) from its model
//! * Rendering the learned automaton [as a transition table](dfa::Dfa::to_table)

pub mod apta;
pub mod cnf;
pub mod constraints;
pub mod dfa;
pub mod encoding;
pub mod graph;
pub mod identify;
pub mod solver;
mod table;

#[cfg(test)]
mod tests;
