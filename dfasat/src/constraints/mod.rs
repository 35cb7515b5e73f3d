//! # Merge-inconsistency constraints graph
//! An undirected graph over the nodes of an [Apta] in which an edge (u, v) means "u and v
//! can never be merged into the same DFA state". Two kinds of edges exist:
//!
//! * *direct conflicts*: u accepts and v rejects (or vice versa);
//! * *indirect conflicts*: merging u and v would, by determinism, force the merge of some
//!   accepting node with some rejecting one further down the trees.
//!
//! Indirect conflicts come out of the recursive [mergeable](ConstraintsGraph::mergeable)
//! test, which simulates the cascade of merges that fusing u with v entails and fails as
//! soon as the cascade hits an existing edge.
//!
//! The graph doubles as the source of the search lower bound: any clique is a set of
//! pairwise-unmergeable nodes, so no DFA with fewer states than the clique size can be
//! consistent with the sample. [ConstraintsGraph::clique] extracts a decent one greedily.

use crate::apta::{Apta, Response};
use crate::graph::{Label, NodeId};
use log::debug;
use std::collections::{HashMap, HashSet};

/// The merge-inconsistency graph of an [Apta]; see the module documentation.
///
/// Node ids coincide with the APTA ids the graph was derived from, and every node remembers
/// the response it was derived with. The graph itself is immutable after construction.
#[derive(Debug, Clone)]
pub struct ConstraintsGraph {
    responses: Vec<Response>,
    adjacency: Vec<HashSet<NodeId>>,
}

impl<L: Label> From<&Apta<L>> for ConstraintsGraph {
    fn from(apta: &Apta<L>) -> Self {
        ConstraintsGraph::from_apta(apta)
    }
}

impl ConstraintsGraph {
    /// Derives the constraints graph of an APTA: clones every node, adds all direct
    /// conflicts, then tests every remaining unordered pair for mergeability and adds an
    /// edge for every pair that fails.
    pub fn from_apta<L: Label>(apta: &Apta<L>) -> Self {
        let responses: Vec<Response> = apta.nodes().map(|id| apta.response(id)).collect();
        let mut graph = ConstraintsGraph {
            adjacency: vec![HashSet::new(); responses.len()],
            responses,
        };

        for u in graph.of_response(Response::Accept) {
            for v in graph.of_response(Response::Reject) {
                graph.add_edge(u, v);
            }
        }
        let direct = graph.edge_count();

        for u in 0..graph.len() {
            for v in u + 1..graph.len() {
                if !graph.adjacent(u, v) && !graph.mergeable(apta, u, v) {
                    graph.add_edge(u, v);
                }
            }
        }
        debug!(
            "constraints graph: {} nodes, {} direct + {} indirect conflicts",
            graph.len(),
            direct,
            graph.edge_count() - direct
        );
        graph
    }

    /// The number of nodes (equal to the node count of the source APTA).
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Checks whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// The response the node was derived with.
    pub fn response(&self, id: NodeId) -> Response {
        self.responses[id]
    }

    /// All responses, indexed by node id.
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// The ids of all nodes carrying the given response, in ascending order.
    pub fn of_response(&self, response: Response) -> Vec<NodeId> {
        (0..self.len())
            .filter(|&id| self.responses[id] == response)
            .collect()
    }

    /// Checks whether u and v must not share a color.
    pub fn adjacent(&self, u: NodeId, v: NodeId) -> bool {
        self.adjacency[u].contains(&v)
    }

    /// The number of edges incident to a node.
    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency[id].len()
    }

    /// The total number of (undirected) edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(HashSet::len).sum::<usize>() / 2
    }

    /// Enumerates every edge exactly once, as pairs (u, v) with u < v, in ascending order.
    pub fn constraints(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for u in 0..self.len() {
            let mut partners: Vec<NodeId> = self.adjacency[u]
                .iter()
                .copied()
                .filter(|&v| v > u)
                .collect();
            partners.sort_unstable();
            edges.extend(partners.into_iter().map(|v| (u, v)));
        }
        edges
    }

    fn add_edge(&mut self, u: NodeId, v: NodeId) {
        debug_assert_ne!(u, v, "the constraints graph has no self-loops");
        self.adjacency[u].insert(v);
        self.adjacency[v].insert(u);
    }

    /// Tests whether two APTA nodes can be fused without forcing an accepting node onto a
    /// rejecting one. Fusing u with v forces, for every label both nodes step on, the fusion
    /// of their children; the test follows that cascade and fails as soon as it hits an
    /// existing edge, either directly or between nodes an earlier step already fused.
    pub fn mergeable<L: Label>(&self, apta: &Apta<L>, u: NodeId, v: NodeId) -> bool {
        let mut merged: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        self.mergeable_rec(apta, u, v, &mut merged)
    }

    fn mergeable_rec<L: Label>(
        &self,
        apta: &Apta<L>,
        u: NodeId,
        v: NodeId,
        merged: &mut HashMap<NodeId, Vec<NodeId>>,
    ) -> bool {
        if u == v {
            return true;
        }
        if self.adjacent(u, v) {
            return false;
        }
        for (label, uc) in apta.arcs(u) {
            if let Some(vc) = apta.follow(v, label) {
                if !self.mergeable_rec(apta, uc, vc, merged) {
                    return false;
                }
            }
        }
        merged.entry(u).or_default().push(v);
        merged.entry(v).or_default().push(u);
        // nodes already fused with one endpoint must stay compatible with the other
        let clashes = |a: NodeId, b: NodeId| {
            merged[&a]
                .iter()
                .any(|&w| w != b && self.adjacent(b, w))
        };
        !clashes(v, u) && !clashes(u, v)
    }

    /// Extracts a clique: a greedy clique over the accepting nodes unioned with a greedy
    /// clique over the rejecting ones. The union is itself a clique because every
    /// accepting-rejecting pair is adjacent by construction.
    ///
    /// Inside one response class the clique is grown from the node of maximum degree by
    /// repeatedly adding the highest-degree neighbor adjacent to every member so far.
    /// Ties on degree keep the highest id (candidates are scanned in ascending order and
    /// a tie replaces the incumbent).
    pub fn clique(&self) -> Vec<NodeId> {
        let mut clique = self.monochromatic_clique(Response::Accept);
        clique.extend(self.monochromatic_clique(Response::Reject));
        debug!("clique lower bound: {} states", clique.len());
        clique
    }

    fn monochromatic_clique(&self, response: Response) -> Vec<NodeId> {
        let members = self.of_response(response);
        let Some(seed) = self.highest_degree(members.iter().copied()) else {
            return Vec::new();
        };
        let mut clique = vec![seed];
        loop {
            let candidates = self.adjacency[seed]
                .iter()
                .copied()
                .filter(|&c| self.responses[c] == response)
                .filter(|&c| !clique.contains(&c))
                .filter(|&c| clique.iter().all(|&m| self.adjacent(c, m)));
            match self.highest_degree(candidates) {
                Some(next) => clique.push(next),
                None => break,
            }
        }
        clique
    }

    /// The highest-degree node of the given set, scanning ids in ascending order and
    /// keeping the last seen on equal degree.
    fn highest_degree(&self, ids: impl Iterator<Item = NodeId>) -> Option<NodeId> {
        let mut ids: Vec<NodeId> = ids.collect();
        ids.sort_unstable();
        let mut best: Option<NodeId> = None;
        for id in ids {
            if best.map_or(true, |b| self.degree(id) >= self.degree(b)) {
                best = Some(id);
            }
        }
        best
    }
}
