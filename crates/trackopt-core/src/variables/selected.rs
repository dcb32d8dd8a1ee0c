//! Selection indicators for nodes and edges.

use crate::graph::{EdgeId, NodeId, TrackGraph};
use crate::variables::VariableKind;

/// 1 iff the node is part of the solution.
#[derive(Debug)]
pub struct NodeSelected;

impl VariableKind for NodeSelected {
    const NAME: &'static str = "NodeSelected";
    type Key = NodeId;

    fn instantiate(graph: &TrackGraph) -> Vec<NodeId> {
        graph.node_ids().collect()
    }
}

/// 1 iff the edge or hyperedge is part of the solution.
#[derive(Debug)]
pub struct EdgeSelected;

impl VariableKind for EdgeSelected {
    const NAME: &'static str = "EdgeSelected";
    type Key = EdgeId;

    fn instantiate(graph: &TrackGraph) -> Vec<EdgeId> {
        graph.edge_ids().cloned().collect()
    }
}
