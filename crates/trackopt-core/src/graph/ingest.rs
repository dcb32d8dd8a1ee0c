//! Ingestion of external directed graphs.
//!
//! An external graph is a plain directed graph whose nodes carry attribute
//! maps. Nodes with the frame attribute are detections. Nodes without it
//! stand for a hyperedge: their predecessors form the incoming side and
//! their successors the outgoing side.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::attrs::Attributes;
use crate::graph::error::GraphError;
use crate::graph::ids::{EdgeId, NodeId};
use crate::graph::track_graph::TrackGraph;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEdge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Node-link form of an external directed graph.
///
/// ```json
/// {"nodes": [{"id": 0, "t": 0}, {"id": 1, "t": 1}],
///  "edges": [{"source": 0, "target": 1, "distance": 2.5}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub nodes: Vec<InputNode>,
    #[serde(default)]
    pub edges: Vec<InputEdge>,
}

/// An input node after the detection/hyperedge split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestNode<'a> {
    Detection(&'a Attributes),
    HyperedgeGroup(&'a Attributes),
}

impl GraphInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn add_node(&mut self, id: impl Into<NodeId>, attributes: Attributes) -> &mut Self {
        self.nodes.push(InputNode {
            id: id.into(),
            attributes,
        });
        self
    }

    pub fn add_edge(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        attributes: Attributes,
    ) -> &mut Self {
        self.edges.push(InputEdge {
            source: source.into(),
            target: target.into(),
            attributes,
        });
        self
    }

    /// Split nodes into detections and hyperedge groups by the presence of
    /// `frame_attribute`. Later duplicates of an id win.
    pub fn classify(&self, frame_attribute: &str) -> BTreeMap<NodeId, IngestNode<'_>> {
        self.nodes
            .iter()
            .map(|node| {
                let kind = if node.attributes.contains_key(frame_attribute) {
                    IngestNode::Detection(&node.attributes)
                } else {
                    IngestNode::HyperedgeGroup(&node.attributes)
                };
                (node.id, kind)
            })
            .collect()
    }
}

struct Adjacency {
    predecessors: BTreeMap<NodeId, Vec<NodeId>>,
    successors: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Adjacency {
    fn build(input: &GraphInput) -> Self {
        let mut predecessors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        let mut successors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for edge in &input.edges {
            push_unique(successors.entry(edge.source).or_default(), edge.target);
            push_unique(predecessors.entry(edge.target).or_default(), edge.source);
        }
        Self {
            predecessors,
            successors,
        }
    }
}

fn push_unique(list: &mut Vec<NodeId>, node: NodeId) {
    if !list.contains(&node) {
        list.push(node);
    }
}

fn edge_label(edge: &InputEdge) -> String {
    format!("({}, {})", edge.source, edge.target)
}

impl TrackGraph {
    /// Build a graph from `input` using `frame_attribute`.
    pub fn from_input(
        input: &GraphInput,
        frame_attribute: impl Into<String>,
    ) -> Result<Self, GraphError> {
        let mut graph = TrackGraph::new(frame_attribute);
        graph.merge_input(input)?;
        Ok(graph)
    }

    /// Merge an external graph into this one.
    ///
    /// Detections become nodes, detection-to-detection edges become ordinary
    /// edges, and each hyperedge group becomes one hyperedge whose sides are
    /// ordered by `(frame, id)`. Re-merging the same input only updates
    /// attributes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoDetections`] when the input has nodes but no
    /// detection, and the usual validation errors of
    /// [`TrackGraph::add_node`] and [`TrackGraph::add_edge`].
    pub fn merge_input(&mut self, input: &GraphInput) -> Result<(), GraphError> {
        let start = Instant::now();
        let classified = input.classify(self.frame_attribute());
        let has_detection = classified
            .values()
            .any(|node| matches!(node, IngestNode::Detection(_)));
        if !classified.is_empty() && !has_detection {
            return Err(GraphError::NoDetections {
                attribute: self.frame_attribute().to_string(),
            });
        }

        for (id, node) in &classified {
            if let IngestNode::Detection(attributes) = node {
                self.add_node(*id, (*attributes).clone())?;
            }
        }

        let adjacency = Adjacency::build(input);
        let mut num_hyperedges = 0usize;
        for edge in &input.edges {
            let lookup = |node: NodeId| {
                classified
                    .get(&node)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownNode {
                        node,
                        edge: edge_label(edge),
                    })
            };
            let source = lookup(edge.source)?;
            let target = lookup(edge.target)?;
            match (source, target) {
                (IngestNode::Detection(_), IngestNode::Detection(_)) => {
                    self.add_edge(
                        EdgeId::simple(edge.source, edge.target),
                        edge.attributes.clone(),
                    )?;
                }
                (IngestNode::Detection(_), IngestNode::HyperedgeGroup(group_attributes)) => {
                    let hyperedge = self.group_edge(edge.target, &adjacency, &classified)?;
                    let mut attributes = group_attributes.clone();
                    attributes.extend(edge.attributes.clone());
                    if !self.contains_edge(&hyperedge) {
                        num_hyperedges += 1;
                    }
                    self.add_edge(hyperedge, attributes)?;
                }
                (IngestNode::HyperedgeGroup(_), _) => {}
            }
        }

        debug!(
            component = "graph",
            operation = "merge_input",
            status = "success",
            num_nodes = self.num_nodes(),
            num_edges = self.num_edges(),
            num_hyperedges,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Merged external graph"
        );
        Ok(())
    }

    fn group_edge(
        &self,
        group: NodeId,
        adjacency: &Adjacency,
        classified: &BTreeMap<NodeId, IngestNode<'_>>,
    ) -> Result<EdgeId, GraphError> {
        let side = |neighbors: Option<&Vec<NodeId>>| -> Result<Vec<NodeId>, GraphError> {
            let mut nodes = neighbors.cloned().unwrap_or_default();
            for node in &nodes {
                if !matches!(classified.get(node), Some(IngestNode::Detection(_))) {
                    return Err(GraphError::MalformedEdge(format!(
                        "hyperedge group {group} is linked to non-detection node {node}"
                    )));
                }
            }
            nodes.sort_by_key(|node| (self.frame_of(*node), *node));
            Ok(nodes)
        };
        let ins = side(adjacency.predecessors.get(&group))?;
        let outs = side(adjacency.successors.get(&group))?;
        EdgeId::hyper(ins, outs)
    }
}
