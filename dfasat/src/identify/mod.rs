//! # Identification loop
//! The outer search for the smallest consistent DFA. The clique of the constraints graph
//! gives the lower bound: no smaller automaton can exist, so the loop starts there,
//! encodes the coloring problem, asks the oracle, and either reconstructs the answer or
//! moves on to one more state.
//!
//! ```no_run
//! use dfasat::apta::Apta;
//! use dfasat::identify::{identify, IdentifyOptions};
//! use dfasat::solver::ProcessSolver;
//! use std::time::Duration;
//!
//! let mut apta = Apta::new();
//! apta.accept_graphemes("ciao");
//! apta.accept_graphemes("ci");
//! apta.reject_graphemes("ciar");
//!
//! let oracle = ProcessSolver::new("picosat", Duration::from_secs(3600));
//! let identification = identify(&apta, &oracle, &IdentifyOptions::default()).unwrap();
//! println!("{}", identification.dfa.to_table());
//! ```

use crate::apta::Apta;
use crate::constraints::ConstraintsGraph;
use crate::dfa::{BuildError, Dfa};
use crate::encoding::{encode, EncodingError, EncodingOptions};
use crate::graph::Label;
use crate::solver::{solve, Oracle, Solution, SolverError};
use log::{debug, info};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Choices for [identify].
#[derive(Debug, Clone)]
pub struct IdentifyOptions {
    /// Safety ceiling on the number of DFA states to try.
    pub k_max: usize,
    /// Clause-set choices passed through to the encoder.
    pub encoding: EncodingOptions,
    /// Where to write the scratch CNF file. Overwritten on every iteration.
    pub scratch: PathBuf,
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        IdentifyOptions {
            k_max: 100,
            encoding: EncodingOptions::default(),
            scratch: env::temp_dir().join("dfasat").join("problem.cnf"),
        }
    }
}

/// Failures of the identification pipeline.
#[derive(Debug, Error)]
pub enum IdentifyError<L: Label> {
    /// The APTA contains no accepted or rejected trace at all.
    #[error("the training sample is empty: no trace was inserted into the APTA")]
    EmptySample,
    /// The encoder rejected its inputs.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// The solver bridge failed; see [SolverError].
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// A satisfying model could not be folded into a DFA.
    #[error("satisfying model is not a DFA: {0}")]
    Reconstruction(#[from] BuildError<L>),
    /// Every color count up to the ceiling was unsatisfiable.
    #[error("no consistent DFA with fewer than {k_max} states")]
    KMaxExhausted { k_max: usize },
}

/// Size statistics of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// The color count tried.
    pub colors: usize,
    /// Variables in the generated formula.
    pub variables: usize,
    /// Clauses in the generated formula.
    pub clauses: usize,
    /// Whether the oracle found a model.
    pub satisfiable: bool,
}

/// The result of a successful identification.
#[derive(Debug)]
pub struct Identification<L: Label> {
    /// The smallest consistent automaton found.
    pub dfa: Dfa<L>,
    /// The color count it was found at.
    pub colors: usize,
    /// The clique size the search started from.
    pub lower_bound: usize,
    /// One entry per SAT call, in order.
    pub attempts: Vec<Attempt>,
}

/// Searches for the smallest DFA consistent with the APTA's traces.
///
/// Derives the constraints graph and its clique, then tries one color count after another,
/// starting at the clique size: encode, solve, and on the first satisfiable answer
/// reconstruct. Color counts below the clique size need no SAT call; the clique edges
/// forbid them outright.
pub fn identify<L: Label>(
    apta: &Apta<L>,
    oracle: &dyn Oracle,
    options: &IdentifyOptions,
) -> Result<Identification<L>, IdentifyError<L>> {
    if !apta.has_labeled_node() {
        return Err(IdentifyError::EmptySample);
    }

    let graph = ConstraintsGraph::from_apta(apta);
    let clique = graph.clique();
    let lower_bound = clique.len().max(1);
    info!(
        "identifying over {} APTA nodes, {} conflict edges, clique of {}",
        apta.len(),
        graph.edge_count(),
        clique.len()
    );

    let mut attempts = Vec::new();
    let mut colors = lower_bound;
    while colors < options.k_max {
        let encoding = encode(apta, &graph, &clique, colors, &options.encoding)?;
        let outcome = solve(encoding.formula(), &options.scratch, oracle)?;
        let satisfiable = matches!(outcome, Solution::Sat(_));
        attempts.push(Attempt {
            colors,
            variables: encoding.variables(),
            clauses: encoding.clauses(),
            satisfiable,
        });
        match outcome {
            Solution::Sat(model) => {
                let dfa = crate::solver::reconstruct(&model)?;
                info!("found a consistent DFA with {colors} states");
                return Ok(Identification {
                    dfa,
                    colors,
                    lower_bound,
                    attempts,
                });
            }
            Solution::Unsat => {
                debug!("{colors} states are not enough");
                colors += 1;
            }
        }
    }
    Err(IdentifyError::KMaxExhausted {
        k_max: options.k_max,
    })
}
