//! Incremental construction of a [Dfa] from solver output. The builder maps the external
//! integer ids coming out of the SAT model (colors) to arena nodes, allocating a node the
//! first time an id is mentioned. Ids never mentioned by any builder call end up in no
//! state at all.

use super::Dfa;
use crate::graph::{Arena, Label, NodeId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors detected while assembling a [Dfa].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError<L: Label> {
    /// Two [DfaBuilder::add_arc] calls disagreed on where the arc leaving `source` on
    /// `label` goes. A well-formed model never produces this: the encoding makes
    /// transitions deterministic in the target color.
    #[error("conflicting transitions from state {from_state} on '{label}': to {first} and to {second}")]
    ConflictingArc {
        from_state: usize,
        label: L,
        first: usize,
        second: usize,
    },
    /// The builder was finished without [DfaBuilder::set_initial] ever being called.
    #[error("no initial state was designated")]
    MissingInitialState,
}

/// Builds a [Dfa] from calls phrased in terms of external integer ids.
///
/// Every operation allocates the mentioned ids on first use, so the same builder works for
/// models of any color count. `add_arc` is idempotent per (source, label) but rejects a
/// conflicting duplicate.
#[derive(Debug, Clone)]
pub struct DfaBuilder<L: Label> {
    graph: Arena<L>,
    accepting: Vec<bool>,
    by_external: HashMap<usize, NodeId>,
    initial: Option<usize>,
}

impl<L: Label> Default for DfaBuilder<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> DfaBuilder<L> {
    /// Creates a builder with no states.
    pub fn new() -> Self {
        DfaBuilder {
            graph: Arena::new(),
            accepting: Vec::new(),
            by_external: HashMap::new(),
            initial: None,
        }
    }

    /// Ensures a state exists for the external id and returns its internal node id.
    pub fn touch(&mut self, external: usize) -> NodeId {
        match self.by_external.get(&external) {
            Some(&id) => id,
            None => {
                let id = self.graph.add_node();
                self.accepting.push(false);
                self.by_external.insert(external, id);
                id
            }
        }
    }

    /// Marks the state with the external id as accepting.
    pub fn set_accept(&mut self, external: usize) {
        let id = self.touch(external);
        self.accepting[id] = true;
    }

    /// Designates the state with the external id as the initial state. Calling it again
    /// re-designates; the last call wins.
    pub fn set_initial(&mut self, external: usize) {
        self.touch(external);
        self.initial = Some(external);
    }

    /// Adds the transition `source --label--> target`. Repeating an identical call is a
    /// no-op; a call that contradicts an earlier one is a [BuildError::ConflictingArc].
    pub fn add_arc(
        &mut self,
        source: usize,
        label: L,
        target: usize,
    ) -> Result<(), BuildError<L>> {
        let from = self.touch(source);
        let to = self.touch(target);
        if let Some(existing) = self.graph.follow(from, &label) {
            if existing == to {
                return Ok(());
            }
            let first = self.external_of(existing);
            return Err(BuildError::ConflictingArc {
                from_state: source,
                label,
                first,
                second: target,
            });
        }
        self.graph.add_arc(from, label, to);
        Ok(())
    }

    /// Finishes the build. Fails if no initial state was designated.
    pub fn finish(mut self) -> Result<Dfa<L>, BuildError<L>> {
        let initial = self
            .initial
            .ok_or(BuildError::MissingInitialState)?;
        let initial = self.by_external[&initial];
        self.graph.set_root(initial);
        Ok(Dfa {
            graph: self.graph,
            accepting: self.accepting,
            initial,
        })
    }

    fn external_of(&self, id: NodeId) -> usize {
        self.by_external
            .iter()
            .find(|(_, &v)| v == id)
            .map(|(&k, _)| k)
            .unwrap_or(id)
    }
}
