//! # Augmented Prefix Tree Acceptor
//! The [Apta] is the prefix tree built from the training traces. Every trace is walked from
//! the root, matching as much of it as possible and growing fresh children for the rest;
//! the node the trace ends on is then marked [Accept](Response::Accept) or
//! [Reject](Response::Reject). Nodes no trace ends on stay [Unknown](Response::Unknown).
//!
//! Since traces only ever extend along existing children, the tree is deterministic by
//! construction: for every (node, label) there is at most one child.
//!
//! ```
//! use dfasat::apta::{Apta, Response};
//!
//! let mut apta = Apta::new();
//! apta.accept_graphemes("ci");
//! apta.reject_graphemes("ciar");
//!
//! assert_eq!(apta.parse_graphemes("ci"), Response::Accept);
//! assert_eq!(apta.parse_graphemes("ciar"), Response::Reject);
//! // "cia" is a prefix of a known trace but no trace ends there
//! assert_eq!(apta.parse_graphemes("cia"), Response::Unknown);
//! // "x" falls off the tree entirely
//! assert_eq!(apta.parse_graphemes("x"), Response::Unknown);
//! ```

use crate::graph::{Arena, ImpossibleTransition, Label, NodeId};
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

/// What the training sample says about the sequence ending on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Response {
    /// A trace labeled as accepted ends here.
    Accept,
    /// A trace labeled as rejected ends here.
    Reject,
    /// No trace ends here (or the sequence left the tree).
    #[default]
    Unknown,
}

/// A prefix tree over labeled traces, with a response per node and a parent back-link per
/// non-root node. The root always has id 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apta<L: Label> {
    graph: Arena<L>,
    responses: Vec<Response>,
    parents: Vec<Option<(NodeId, L)>>,
}

impl<L: Label> Default for Apta<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> Apta<L> {
    /// Creates an APTA holding only an unlabeled root.
    pub fn new() -> Self {
        let mut graph = Arena::new();
        graph.add_root();
        Apta {
            graph,
            responses: vec![Response::Unknown],
            parents: vec![None],
        }
    }

    /// Builds an APTA from two collections of traces, the first accepted and the second
    /// rejected.
    pub fn from_traces<'a, I, J>(accepted: I, rejected: J) -> Self
    where
        L: 'a,
        I: IntoIterator<Item = &'a [L]>,
        J: IntoIterator<Item = &'a [L]>,
    {
        let mut apta = Apta::new();
        for seq in accepted {
            apta.accept(seq);
        }
        for seq in rejected {
            apta.reject(seq);
        }
        apta
    }

    /// The root node. It exists from construction and its id is stable.
    pub fn root(&self) -> NodeId {
        self.graph
            .root()
            .expect("an APTA always has a root")
    }

    /// The number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Checks whether the tree consists of the root alone.
    pub fn is_empty(&self) -> bool {
        self.graph.len() == 1
    }

    /// The response recorded on a node.
    pub fn response(&self, id: NodeId) -> Response {
        self.responses[id]
    }

    /// The parent of a node together with the label on the incoming edge. `None` for the
    /// root.
    pub fn parent(&self, id: NodeId) -> Option<&(NodeId, L)> {
        self.parents[id].as_ref()
    }

    /// Iterates over all node ids. Ids are dense, so this is simply `0..len`.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        self.graph.ids()
    }

    /// The arcs leaving a node, as (label, child) pairs.
    pub fn arcs(&self, from: NodeId) -> impl Iterator<Item = (&L, NodeId)> {
        self.graph.arcs(from)
    }

    /// Follows the child arc with the given label.
    pub fn follow(&self, from: NodeId, label: &L) -> Option<NodeId> {
        self.graph.follow(from, label)
    }

    /// Every distinct label appearing on some arc of the tree, in first-encounter order.
    pub fn alphabet(&self) -> Vec<L> {
        let mut seen = std::collections::HashSet::new();
        let mut labels = Vec::new();
        for id in self.graph.iter() {
            for (label, _) in self.graph.arcs(id) {
                if seen.insert(label.clone()) {
                    labels.push(label.clone());
                }
            }
        }
        labels
    }

    /// Checks whether any node carries an Accept or Reject response, i.e. whether at least
    /// one trace was inserted.
    pub fn has_labeled_node(&self) -> bool {
        self.responses
            .iter()
            .any(|&r| r != Response::Unknown)
    }

    /// Adds an arc and maintains the child's back-link. If the arc replaces an existing one,
    /// the previous child's back-link is cleared.
    pub fn add_arc(&mut self, parent: NodeId, label: L, child: NodeId) {
        if let Some(previous) = self.graph.add_arc(parent, label.clone(), child) {
            self.parents[previous] = None;
        }
        self.parents[child] = Some((parent, label));
    }

    /// Removes the arc leaving `parent` with the given label, clearing the child's
    /// back-link.
    pub fn remove_arc(&mut self, parent: NodeId, label: &L) -> Option<NodeId> {
        let child = self.graph.remove_arc(parent, label)?;
        self.parents[child] = None;
        Some(child)
    }

    /// Inserts a trace as accepted: walks the tree as far as the trace matches, grows fresh
    /// children for the remainder and marks the terminal node [Response::Accept].
    pub fn accept(&mut self, seq: &[L]) {
        self.insert(seq, Response::Accept);
    }

    /// Inserts a trace as rejected; see [Apta::accept].
    pub fn reject(&mut self, seq: &[L]) {
        self.insert(seq, Response::Reject);
    }

    /// Inserts a trace with an explicit response. The terminal node's response is
    /// overwritten, so the last trace ending on a node wins. Inserting with
    /// [Response::Unknown] is a no-op.
    pub fn insert(&mut self, seq: &[L], response: Response) {
        if response == Response::Unknown {
            return;
        }
        let mut at = self.root();
        for label in seq {
            at = match self.graph.follow(at, label) {
                Some(child) => child,
                None => self.extend(at, label.clone()),
            };
        }
        self.responses[at] = response;
    }

    fn extend(&mut self, parent: NodeId, label: L) -> NodeId {
        let child = self.graph.add_node();
        self.responses.push(Response::Unknown);
        self.parents.push(None);
        self.add_arc(parent, label, child);
        child
    }

    /// Follows a trace from the root and reports the response of the node it ends on.
    /// Returns [Response::Unknown] when any transition along the way is missing.
    pub fn parse(&self, seq: &[L]) -> Response {
        match self.graph.follow_path(seq) {
            Some(id) => self.responses[id],
            None => Response::Unknown,
        }
    }

    /// Like [Apta::parse] but collapsed to a boolean: Accept maps to `true`, Reject and
    /// Unknown to `false`. Under `strict`, falling off the tree is an error instead.
    pub fn parse_binary(
        &self,
        seq: &[L],
        strict: bool,
    ) -> Result<bool, ImpossibleTransition<L>> {
        let mut at = self.root();
        for label in seq {
            match self.graph.follow(at, label) {
                Some(child) => at = child,
                None if strict => {
                    return Err(ImpossibleTransition {
                        from: at,
                        label: label.clone(),
                    })
                }
                None => return Ok(false),
            }
        }
        Ok(self.responses[at] == Response::Accept)
    }
}

impl Apta<Rc<str>> {
    /// Inserts a string as an accepted trace, one label per extended grapheme cluster.
    pub fn accept_graphemes(&mut self, word: &str) {
        self.accept(&graphemes(word));
    }

    /// Inserts a string as a rejected trace, one label per extended grapheme cluster.
    pub fn reject_graphemes(&mut self, word: &str) {
        self.reject(&graphemes(word));
    }

    /// Parses a string, one label per extended grapheme cluster.
    pub fn parse_graphemes(&self, word: &str) -> Response {
        self.parse(&graphemes(word))
    }
}

/// Splits a string into one `Rc<str>` label per extended grapheme cluster.
pub fn graphemes(word: &str) -> Vec<Rc<str>> {
    word.graphemes(true).map(Rc::from).collect()
}
