//! Helpers on solved graphs.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::graph::{GraphError, NodeId, TrackGraph};

/// Split `graph` into its weakly connected components, one
/// [`TrackGraph`] per track, ordered by smallest node id.
///
/// Hyperedges connect all of their nodes, so both daughters of a division
/// end up in the parent's track.
pub fn get_tracks(graph: &TrackGraph) -> Result<Vec<TrackGraph>, GraphError> {
    let mut parent: BTreeMap<NodeId, NodeId> = graph.node_ids().map(|node| (node, node)).collect();

    fn find(parent: &mut BTreeMap<NodeId, NodeId>, node: NodeId) -> NodeId {
        let mut root = node;
        while let Some(&next) = parent.get(&root) {
            if next == root {
                break;
            }
            root = next;
        }
        let mut current = node;
        while current != root {
            let Some(next) = parent.insert(current, root) else {
                break;
            };
            current = next;
        }
        root
    }

    for edge in graph.edge_ids() {
        let nodes = edge.nodes();
        let Some((&first, rest)) = nodes.split_first() else {
            continue;
        };
        for &node in rest {
            let a = find(&mut parent, first);
            let b = find(&mut parent, node);
            // Smallest id becomes the root so component order follows it.
            if a < b {
                parent.insert(b, a);
            } else if b < a {
                parent.insert(a, b);
            }
        }
    }

    let mut components: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    let nodes: Vec<NodeId> = parent.keys().copied().collect();
    for node in nodes {
        let root = find(&mut parent, node);
        components.entry(root).or_default().insert(node);
    }

    let mut tracks: Vec<TrackGraph> = Vec::with_capacity(components.len());
    let mut track_of: BTreeMap<NodeId, usize> = BTreeMap::new();
    for (position, members) in components.values().enumerate() {
        let mut track = TrackGraph::new(graph.frame_attribute());
        for node in members {
            let attributes = graph.node_attrs(*node).cloned().unwrap_or_default();
            track.add_node(*node, attributes)?;
            track_of.insert(*node, position);
        }
        tracks.push(track);
    }
    for (edge, attributes) in graph.edges() {
        let Some(position) = edge.nodes().first().and_then(|node| track_of.get(node)) else {
            continue;
        };
        tracks[*position].add_edge(edge.clone(), attributes.clone())?;
    }

    debug!(
        component = "utils",
        operation = "get_tracks",
        status = "success",
        num_tracks = tracks.len(),
        "Split graph into tracks"
    );
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::graph::EdgeId;

    #[test]
    fn test_components_ordered_by_smallest_node() {
        let mut graph = TrackGraph::default();
        for (node, frame) in [(5u64, 0), (6, 1), (0, 0), (1, 1), (2, 1), (9, 2)] {
            graph.add_node(node, attrs! { "t" => frame }).unwrap();
        }
        graph.add_edge(EdgeId::simple(5u64, 6u64), attrs! {}).unwrap();
        graph
            .add_edge(EdgeId::hyper([0u64], [1u64, 2u64]).unwrap(), attrs! { "score" => 0.5 })
            .unwrap();

        let tracks = get_tracks(&graph).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].node_ids().collect::<Vec<_>>(), vec![
            NodeId::new(0),
            NodeId::new(1),
            NodeId::new(2)
        ]);
        assert_eq!(tracks[0].num_edges(), 1);
        assert_eq!(tracks[1].node_ids().collect::<Vec<_>>(), vec![
            NodeId::new(5),
            NodeId::new(6)
        ]);
        assert_eq!(tracks[2].num_nodes(), 1);
        assert_eq!(tracks[2].num_edges(), 0);
    }

    #[test]
    fn test_empty_graph_has_no_tracks() {
        assert!(get_tracks(&TrackGraph::default()).unwrap().is_empty());
    }

    #[test]
    fn test_tracks_keep_frame_attribute() {
        let mut graph = TrackGraph::new("frame");
        graph.add_node(0u64, attrs! { "frame" => 3 }).unwrap();
        let tracks = get_tracks(&graph).unwrap();
        assert_eq!(tracks[0].frame_attribute(), "frame");
        assert_eq!(tracks[0].frame_of(NodeId::new(0)), Some(3));
    }
}
