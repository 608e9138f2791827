//! Cycle checking for a single candidate edge against a partition's current edge set.

use petgraph::{
    graphmap::GraphMap,
    visit::{depth_first_search, Control, DfsEvent},
    Directed,
};
use std::iter::once;

use crate::properties::NodeId;

/// Parent -> child adjacency used for traversal. Node and edge order follow insertion order, so
/// traversal is deterministic for a given input sequence.
pub type EdgeGraph = GraphMap<NodeId, (), Directed>;

/// Returns the first back edge found by a depth-first traversal over `edges ∪ {candidate}`, or
/// `None` when the combined graph is acyclic.
///
/// The caller decides what `edges` holds: for a re-parent it must already exclude the edge being
/// replaced. A self-loop candidate is reported as the back edge `(child, child)`.
pub fn find_back_edge<I>(edges: I, candidate: (NodeId, NodeId)) -> Option<(NodeId, NodeId)>
where
    I: IntoIterator<Item = (NodeId, NodeId)>,
{
    let graph = EdgeGraph::from_edges(edges.into_iter().chain(once(candidate)));
    let found = depth_first_search(&graph, graph.nodes(), |event| match event {
        // A back edge points at a node still on the traversal stack.
        DfsEvent::BackEdge(source, sink) => Control::Break((source, sink)),
        _ => Control::Continue,
    })
    .break_value();
    if let Some((source, sink)) = found {
        tracing::debug!(
            "[find_back_edge] candidate {} -> {} closes a cycle at back edge {} -> {}",
            candidate.0,
            candidate.1,
            source,
            sink
        );
    }
    found
}

/// `true` if adding `candidate` to `edges` would leave the graph with a directed cycle.
///
/// O(V + E) per call. Whether a cycle exists does not depend on iteration order; only which
/// back edge [`find_back_edge`] reports first does.
pub fn would_create_cycle<I>(edges: I, candidate: (NodeId, NodeId)) -> bool
where
    I: IntoIterator<Item = (NodeId, NodeId)>,
{
    find_back_edge(edges, candidate).is_some()
}
