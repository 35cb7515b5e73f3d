//! # Solver bridge and DFA reconstruction
//! The SAT oracle is a black box deciding DIMACS CNF files. The [Oracle] trait is that
//! box's outline: hand it a file, get back a [Verdict]. The production implementation,
//! [ProcessSolver], spawns an external solver executable with a deadline; swapping the
//! oracle (for tests, or for a different solver) touches nothing else in the pipeline.
//!
//! [solve] is the bridge proper: it serializes a formula to the scratch file, invokes the
//! oracle, and translates the raw integer model back into the typed variables of the
//! encoding. [reconstruct] then folds the positively-assigned variables into a [Dfa] by
//! dispatching on their roles.

use crate::cnf::{dimacs, Formula, VarRole, Variable};
use crate::dfa::{BuildError, Dfa, DfaBuilder};
use crate::graph::Label;
use log::{debug, trace};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

mod output;

pub use output::OutputError;

/// What an oracle can say about a CNF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Satisfiable, with the model as signed DIMACS literals (positive = true).
    Sat(Vec<i64>),
    /// Unsatisfiable.
    Unsat,
}

/// A SAT oracle deciding DIMACS CNF files.
pub trait Oracle {
    /// Decides the formula in the given DIMACS file.
    fn solve(&self, cnf: &Path) -> Result<Verdict, SolverError>;
}

/// Failures of the solver bridge. All of them are fatal to the current run; an
/// unsatisfiable verdict is not a failure but a [Verdict].
#[derive(Debug, Error)]
pub enum SolverError {
    /// Writing the scratch CNF, spawning the solver or reading its output failed.
    #[error("solver io failure: {0}")]
    Io(#[from] io::Error),
    /// The solver exceeded its time limit and was killed.
    #[error("solver exceeded the {}s time limit", .limit.as_secs())]
    Timeout { limit: Duration },
    /// The solver's output could not be understood.
    #[error("unusable solver output: {0}")]
    Output(#[from] OutputError),
    /// The model referenced a variable id the emitted DIMACS file never contained.
    #[error("model referenced unknown variable id {0}")]
    UnknownVariable(usize),
}

/// An external SAT solver executable, invoked per CNF file with a deadline.
///
/// The solver is expected to speak the DIMACS competition output format (`s` status line,
/// `v` model lines); `picosat` does so out of the box, most others with a flag.
#[derive(Debug, Clone)]
pub struct ProcessSolver {
    command: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

impl ProcessSolver {
    /// Creates a solver invoking `command <args> <cnf-file>` with the given time limit.
    pub fn new(command: impl Into<PathBuf>, timeout: Duration) -> Self {
        ProcessSolver {
            command: command.into(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Appends an extra command-line argument, passed before the CNF file path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several extra command-line arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Oracle for ProcessSolver {
    fn solve(&self, cnf: &Path) -> Result<Verdict, SolverError> {
        // stdout goes to a sibling file so the child can never fill a pipe and stall
        let transcript = cnf.with_extension("out");
        let stdout = File::create(&transcript)?;
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(cnf)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::null())
            .spawn()?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait()? {
                Some(status) => {
                    trace!("solver exited with {status}");
                    break;
                }
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SolverError::Timeout {
                        limit: self.timeout,
                    });
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        }

        let text = fs::read_to_string(&transcript)?;
        Ok(output::parse(&text)?)
    }
}

/// The outcome of one [solve] call.
#[derive(Debug, Clone)]
pub enum Solution<L: Label> {
    /// A satisfying model, given as the positively-assigned typed variables. Each carried
    /// variable has had its assignment slot set to true.
    Sat(Vec<Rc<Variable<L>>>),
    /// No model exists for this formula.
    Unsat,
}

/// Writes `formula` to the scratch DIMACS file, has the oracle decide it, and translates
/// the model back through the saver's id map.
///
/// A formula containing an empty clause is a contradiction no search is needed for; it is
/// reported as [Solution::Unsat] without bothering the oracle.
pub fn solve<L: Label>(
    formula: &Formula<L>,
    scratch: &Path,
    oracle: &dyn Oracle,
) -> Result<Solution<L>, SolverError> {
    if formula.has_empty_clause() {
        debug!("formula contains an empty clause, skipping the oracle");
        return Ok(Solution::Unsat);
    }

    let map = dimacs::save(formula, scratch)?;
    debug!(
        "wrote {} ({} variables, {} clauses)",
        scratch.display(),
        map.len(),
        formula.len()
    );

    match oracle.solve(scratch)? {
        Verdict::Unsat => Ok(Solution::Unsat),
        Verdict::Sat(model) => {
            let mut assigned = Vec::new();
            for literal in model {
                if literal <= 0 {
                    continue;
                }
                let id = literal as usize;
                let var = map
                    .variable(id)
                    .ok_or(SolverError::UnknownVariable(id))?;
                var.assign(true);
                assigned.push(var.clone());
            }
            Ok(Solution::Sat(assigned))
        }
    }
}

/// Folds the positively-assigned variables of a satisfying model into a [Dfa]:
/// `z(i)` marks color `i` accepting, `y(a,i,j)` becomes the arc `i --a--> j`, the root's
/// initial-tagged color becomes the initial state, and plain `x` variables are skipped
/// (colors are realized through `y` and `z`).
pub fn reconstruct<L: Label>(model: &[Rc<Variable<L>>]) -> Result<Dfa<L>, BuildError<L>> {
    let mut builder = DfaBuilder::new();
    for var in model {
        match var.role() {
            VarRole::AcceptingColor { color } => builder.set_accept(*color),
            VarRole::Transition {
                label,
                source,
                target,
            } => builder.add_arc(*source, label.clone(), *target)?,
            VarRole::InitialNodeColor { color, .. } => builder.set_initial(*color),
            VarRole::NodeColor { .. } => {}
        }
    }
    builder.finish()
}
