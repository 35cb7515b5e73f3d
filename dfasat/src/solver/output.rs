//! Parsing of SAT solver output in the DIMACS competition format: `c` comment lines, one
//! `s SATISFIABLE` / `s UNSATISFIABLE` status line, and for satisfiable instances `v` lines
//! carrying the model as signed variable ids terminated by a `0`.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1, space1};
use nom::combinator::{map, map_res, opt, recognize};
use nom::multi::separated_list1;
use nom::sequence::{pair, preceded};
use nom::IResult;
use thiserror::Error;

use super::Verdict;

/// Output that could not be understood as a solver answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// No `s` status line was found at all.
    #[error("no status line in solver output")]
    MissingStatus,
    /// The solver answered `s UNKNOWN` (gave up without deciding).
    #[error("solver reported an indeterminate result")]
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

fn literal(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse)(input)
}

fn value_line(input: &str) -> IResult<&str, Vec<i64>> {
    preceded(pair(char('v'), space1), separated_list1(space1, literal))(input)
}

fn status_line(input: &str) -> IResult<&str, Status> {
    preceded(
        pair(char('s'), space1),
        alt((
            map(tag("SATISFIABLE"), |_| Status::Satisfiable),
            map(tag("UNSATISFIABLE"), |_| Status::Unsatisfiable),
            map(tag("UNKNOWN"), |_| Status::Unknown),
        )),
    )(input)
}

/// Parses a whole solver transcript into a [Verdict]. Lines that are neither status nor
/// value lines (comments, timing chatter) are ignored.
pub(super) fn parse(text: &str) -> Result<Verdict, OutputError> {
    let mut status = None;
    let mut model = Vec::new();
    let mut terminated = false;
    for line in text.lines() {
        let line = line.trim();
        if let Ok((_, s)) = status_line(line) {
            status = Some(s);
        } else if let Ok((_, literals)) = value_line(line) {
            for literal in literals {
                if terminated {
                    break;
                }
                if literal == 0 {
                    terminated = true;
                } else {
                    model.push(literal);
                }
            }
        }
    }
    match status {
        Some(Status::Satisfiable) => Ok(Verdict::Sat(model)),
        Some(Status::Unsatisfiable) => Ok(Verdict::Unsat),
        Some(Status::Unknown) => Err(OutputError::Indeterminate),
        None => Err(OutputError::MissingStatus),
    }
}
