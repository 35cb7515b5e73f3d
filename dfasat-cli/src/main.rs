use clap::Parser;
use dfasat::apta::{graphemes, Apta};
use dfasat::encoding::EncodingOptions;
use dfasat::identify::{identify, IdentifyError, IdentifyOptions};
use dfasat::solver::ProcessSolver;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

mod traces;

use traces::TraceError;

/// Learns the smallest DFA consistent with a directory of labeled traces and optionally
/// replays a second directory of traces against it.
#[derive(Debug, Parser)]
#[command(name = "dfasat", version)]
struct DfasatArgs {
    /// Directory of training trace files (one trace per line; files whose name contains
    /// "ok" hold accepted traces, all others rejected ones)
    training: PathBuf,
    /// Directory of traces to replay against the learned automaton
    testing: Option<PathBuf>,
    /// Safety ceiling on the number of states to try
    #[arg(long, default_value_t = 100)]
    k_max: usize,
    /// SAT solver executable; it must print the DIMACS competition output format
    #[arg(long, default_value = "picosat")]
    solver: String,
    /// Extra argument passed to the solver before the CNF file (repeatable)
    #[arg(long = "solver-arg", value_name = "ARG")]
    solver_args: Vec<String>,
    /// Time limit for each solver call, in seconds
    #[arg(long, default_value_t = 3600)]
    timeout: u64,
    /// Emit only the minimal-sufficient clause set (the learned transition function may
    /// then be partial)
    #[arg(long)]
    minimal: bool,
    /// Split trace lines on whitespace instead of unicode grapheme clusters
    #[arg(long)]
    tokens: bool,
    /// Path of the scratch CNF file handed to the solver
    #[arg(long)]
    scratch: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Traces(#[from] TraceError),
    #[error(transparent)]
    Identify(#[from] IdentifyError<Rc<str>>),
    #[error("{failed}/{total} test traces disagree with the learned automaton")]
    TestFailures { failed: usize, total: usize },
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Traces(_) => 2,
            CliError::Identify(IdentifyError::EmptySample) => 2,
            _ => 1,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = DfasatArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn run(args: &DfasatArgs) -> Result<(), CliError> {
    let training = traces::load_dir(&args.training)?;
    let mut apta = Apta::new();
    for trace in &training {
        let labels = split(&trace.text, args.tokens);
        if trace.accept {
            apta.accept(&labels);
        } else {
            apta.reject(&labels);
        }
    }
    info!(
        "loaded {} training traces into {} APTA nodes",
        training.len(),
        apta.len()
    );

    let oracle = ProcessSolver::new(
        args.solver.as_str(),
        Duration::from_secs(args.timeout),
    )
    .args(args.solver_args.iter().cloned());

    let mut options = IdentifyOptions {
        k_max: args.k_max,
        encoding: EncodingOptions {
            minimal: args.minimal,
        },
        ..IdentifyOptions::default()
    };
    if let Some(scratch) = &args.scratch {
        options.scratch = scratch.clone();
    }

    let identification = identify(&apta, &oracle, &options)?;
    println!("{}", identification.dfa.ascii_table());
    println!(
        "{} states (lower bound {}, {} SAT call{})",
        identification.dfa.len(),
        identification.lower_bound,
        identification.attempts.len(),
        if identification.attempts.len() == 1 { "" } else { "s" }
    );

    if let Some(testing) = &args.testing {
        let tests = traces::load_dir(testing)?;
        let mut failed = 0;
        for trace in &tests {
            let labels = split(&trace.text, args.tokens);
            let verdict = identification.dfa.parse(&labels, true);
            match verdict {
                Ok(accepted) if accepted == trace.accept => {
                    println!("[ OK ] {}", trace.text);
                }
                Ok(_) => {
                    failed += 1;
                    println!(
                        "[FAIL] {} ({}:{})",
                        trace.text,
                        trace.file.display(),
                        trace.line
                    );
                }
                Err(stuck) => {
                    failed += 1;
                    println!(
                        "[FAIL] {} ({}:{}, {stuck})",
                        trace.text,
                        trace.file.display(),
                        trace.line
                    );
                }
            }
        }
        let total = tests.len();
        println!("{}/{total} traces passed", total - failed);
        if failed > 0 {
            return Err(CliError::TestFailures { failed, total });
        }
    }
    Ok(())
}

fn split(text: &str, tokens: bool) -> Vec<Rc<str>> {
    if tokens {
        text.split_whitespace().map(Rc::from).collect()
    } else {
        graphemes(text)
    }
}
