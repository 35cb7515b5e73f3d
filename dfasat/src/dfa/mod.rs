//! # Deterministic Finite Automaton
//! The [Dfa] is the output of the identification pipeline: a deterministic automaton with a
//! distinguished initial state and a per-state accept flag. States carry no names, only
//! dense integer ids; the solver's colors become those ids through the [DfaBuilder].
//!
//! Unlike the prefix tree it was learned from, the automaton is a general graph: arcs may
//! form cycles, and with the minimal clause set the transition function may be partial
//! (labels a state was never observed under have no arc). [Dfa::parse] therefore takes a
//! `strict` flag: under strict parsing a missing transition is an
//! [ImpossibleTransition] error, otherwise the sequence is simply not accepted.
//!
//! ```
//! use dfasat::dfa::DfaBuilder;
//!
//! // A two-state automaton accepting an even number of 'a's
//! let mut builder = DfaBuilder::new();
//! builder.set_initial(0);
//! builder.set_accept(0);
//! builder.add_arc(0, 'a', 1).unwrap();
//! builder.add_arc(1, 'a', 0).unwrap();
//! let dfa = builder.finish().unwrap();
//!
//! assert_eq!(dfa.parse(&['a', 'a'], true), Ok(true));
//! assert_eq!(dfa.parse(&['a'], true), Ok(false));
//! // 'b' was never mentioned: strict parsing falls off the automaton
//! assert!(dfa.parse(&['b'], true).is_err());
//! assert_eq!(dfa.parse(&['b'], false), Ok(false));
//! ```

use crate::graph::{Arena, ImpossibleTransition, Label, NodeId};
use crate::table::Table;
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

mod build;

pub use build::{BuildError, DfaBuilder};

/// A deterministic finite automaton with integer state ids, built by a [DfaBuilder].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa<L: Label> {
    graph: Arena<L>,
    accepting: Vec<bool>,
    initial: NodeId,
}

impl<L: Label> Dfa<L> {
    /// The initial state.
    pub fn initial(&self) -> NodeId {
        self.initial
    }

    /// The number of states.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Checks whether the automaton has no states. A built automaton never is: the builder
    /// requires an initial state.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Checks whether a state is accepting.
    pub fn is_accepting(&self, id: NodeId) -> bool {
        self.accepting[id]
    }

    /// Iterates over all state ids.
    pub fn states(&self) -> impl Iterator<Item = NodeId> {
        self.graph.ids()
    }

    /// The transitions leaving a state, as (label, target) pairs.
    pub fn transitions(&self, from: NodeId) -> impl Iterator<Item = (&L, NodeId)> {
        self.graph.arcs(from)
    }

    /// Follows one transition.
    pub fn follow(&self, from: NodeId, label: &L) -> Option<NodeId> {
        self.graph.follow(from, label)
    }

    /// Every distinct label appearing on some transition, sorted by canonical string form
    /// so that rendering is stable.
    pub fn alphabet(&self) -> Vec<L> {
        let mut seen = std::collections::HashSet::new();
        let mut labels = Vec::new();
        for id in self.graph.ids() {
            for (label, _) in self.graph.arcs(id) {
                if seen.insert(label.clone()) {
                    labels.push(label.clone());
                }
            }
        }
        labels.sort_by_key(|l| l.to_string());
        labels
    }

    /// Runs a sequence through the automaton from the initial state and reports whether the
    /// state it ends in is accepting. A missing transition is an [ImpossibleTransition]
    /// error under `strict`, and plain non-acceptance otherwise.
    pub fn parse(&self, seq: &[L], strict: bool) -> Result<bool, ImpossibleTransition<L>> {
        let mut at = self.initial;
        for label in seq {
            match self.graph.follow(at, label) {
                Some(next) => at = next,
                None if strict => {
                    return Err(ImpossibleTransition {
                        from: at,
                        label: label.clone(),
                    })
                }
                None => return Ok(false),
            }
        }
        Ok(self.accepting[at])
    }

    /// Checks whether this automaton accepts the given sequence. Equivalent to lenient
    /// [Dfa::parse]: a sequence that falls off the automaton is simply not accepted.
    pub fn accepts(&self, seq: &[L]) -> bool {
        self.parse(seq, false).unwrap_or(false)
    }

    /// Generates a transition table of this automaton suitable for printing. States are
    /// named `q0`, `q1`, ... after their ids; the initial state is marked with an arrow and
    /// accepting states with `*`. Missing transitions render as `-`.
    pub fn to_table(&self) -> String {
        self.gen_table("→")
    }

    /// Like [Dfa::to_table] but with an ASCII arrow for the initial state.
    pub fn ascii_table(&self) -> String {
        self.gen_table("->")
    }

    fn gen_table(&self, arrow: &str) -> String {
        let alphabet = self.alphabet();
        let mut table = Table::default();

        let mut head = vec![String::new(), String::new(), String::new()];
        head.extend(alphabet.iter().map(|l| l.to_string()));
        table.push_row(head);

        for id in self.states() {
            let mut row = vec![
                if id == self.initial {
                    arrow.to_string()
                } else {
                    String::new()
                },
                if self.accepting[id] {
                    "*".to_string()
                } else {
                    String::new()
                },
                format!("q{id}"),
            ];
            for label in &alphabet {
                row.push(match self.graph.follow(id, label) {
                    Some(to) => format!("q{to}"),
                    None => "-".to_string(),
                });
            }
            table.push_row(row);
        }
        table.to_string(" ")
    }
}

impl Dfa<Rc<str>> {
    /// Parses a string, one label per extended grapheme cluster; see [Dfa::parse].
    pub fn parse_graphemes(
        &self,
        word: &str,
        strict: bool,
    ) -> Result<bool, ImpossibleTransition<Rc<str>>> {
        let labels: Vec<Rc<str>> = word.graphemes(true).map(Rc::from).collect();
        self.parse(&labels, strict)
    }

    /// Checks whether this automaton accepts the given string, one label per extended
    /// grapheme cluster.
    pub fn accepts_graphemes(&self, word: &str) -> bool {
        self.parse_graphemes(word, false).unwrap_or(false)
    }
}
