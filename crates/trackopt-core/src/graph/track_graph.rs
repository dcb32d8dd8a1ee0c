//! Time-indexed candidate graph.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::graph::attrs::Attributes;
use crate::graph::error::GraphError;
use crate::graph::ids::{EdgeId, NodeId};

/// Default name of the frame attribute.
pub const DEFAULT_FRAME_ATTRIBUTE: &str = "t";

/// Frame range and per-frame node lists, derived from the nodes.
#[derive(Debug, Clone, Default)]
pub struct FrameIndex {
    frames: Option<(i64, i64)>,
    nodes_by_frame: BTreeMap<i64, Vec<NodeId>>,
}

impl FrameIndex {
    fn build(graph: &TrackGraph) -> Self {
        let mut nodes_by_frame: BTreeMap<i64, Vec<NodeId>> = BTreeMap::new();
        for node in graph.nodes.keys() {
            if let Some(frame) = graph.frame_of(*node) {
                nodes_by_frame.entry(frame).or_default().push(*node);
            }
        }
        let frames = match (nodes_by_frame.keys().next(), nodes_by_frame.keys().next_back()) {
            (Some(first), Some(last)) => Some((*first, *last + 1)),
            _ => None,
        };
        trace!(
            component = "graph",
            operation = "recompute_metadata",
            status = "success",
            num_frames = nodes_by_frame.len(),
            "Recomputed frame index"
        );
        Self {
            frames,
            nodes_by_frame,
        }
    }

    /// `(begin, end)` with `end` exclusive, or `None` for an empty graph.
    pub fn frames(&self) -> Option<(i64, i64)> {
        self.frames
    }

    pub fn nodes_by_frame(&self, frame: i64) -> &[NodeId] {
        self.nodes_by_frame
            .get(&frame)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Detections (nodes) and candidate links (edges and hyperedges) over
/// discrete frames.
///
/// Every node carries an integer frame attribute. Ordinary edges point
/// strictly forward in time. `prev_edges`/`next_edges` list, per node, the
/// edges entering and leaving it, hyperedges included.
#[derive(Debug, Clone)]
pub struct TrackGraph {
    frame_attribute: String,
    nodes: BTreeMap<NodeId, Attributes>,
    edges: BTreeMap<EdgeId, Attributes>,
    prev_edges: BTreeMap<NodeId, Vec<EdgeId>>,
    next_edges: BTreeMap<NodeId, Vec<EdgeId>>,
    metadata: OnceCell<FrameIndex>,
}

impl Default for TrackGraph {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_ATTRIBUTE)
    }
}

impl TrackGraph {
    pub fn new(frame_attribute: impl Into<String>) -> Self {
        Self {
            frame_attribute: frame_attribute.into(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            prev_edges: BTreeMap::new(),
            next_edges: BTreeMap::new(),
            metadata: OnceCell::new(),
        }
    }

    pub fn frame_attribute(&self) -> &str {
        &self.frame_attribute
    }

    // ── Mutation ────────────────────────────────────────────

    /// Add a node, or merge `attributes` into an existing one.
    ///
    /// # Errors
    ///
    /// Fails when the merged attributes lack an integer frame, or when a
    /// changed frame would make an incident ordinary edge point backwards.
    pub fn add_node(
        &mut self,
        node: impl Into<NodeId>,
        attributes: Attributes,
    ) -> Result<(), GraphError> {
        let node = node.into();
        let mut merged = self.nodes.get(&node).cloned().unwrap_or_default();
        merged.extend(attributes);

        let frame = self.read_frame(node, &merged)?;
        if self.frame_of(node).is_some_and(|old| old != frame) {
            self.check_incident_edges(node, frame)?;
        }

        self.nodes.insert(node, merged);
        self.prev_edges.entry(node).or_default();
        self.next_edges.entry(node).or_default();
        self.invalidate();
        trace!(
            component = "graph",
            operation = "add_node",
            status = "success",
            node = node.inner(),
            frame,
            "Added node"
        );
        Ok(())
    }

    /// Add an edge or hyperedge, or merge `attributes` into an existing one.
    ///
    /// # Errors
    ///
    /// Fails when an incident node is unknown or an ordinary edge does not
    /// point forward in time.
    pub fn add_edge(&mut self, edge: EdgeId, attributes: Attributes) -> Result<(), GraphError> {
        for node in edge.nodes() {
            if !self.nodes.contains_key(&node) {
                return Err(GraphError::UnknownNode {
                    node,
                    edge: edge.to_string(),
                });
            }
        }
        if let EdgeId::Simple(source, target) = &edge {
            self.check_forward(&edge, self.frame_or_zero(*source), self.frame_or_zero(*target))?;
        }

        if let Some(existing) = self.edges.get_mut(&edge) {
            existing.extend(attributes);
            return Ok(());
        }

        for node in edge.in_nodes() {
            self.next_edges.entry(node).or_default().push(edge.clone());
        }
        for node in edge.out_nodes() {
            self.prev_edges.entry(node).or_default().push(edge.clone());
        }
        trace!(
            component = "graph",
            operation = "add_edge",
            status = "success",
            edge = %edge,
            hyper = edge.is_hyperedge(),
            "Added edge"
        );
        self.edges.insert(edge, attributes);
        self.invalidate();
        Ok(())
    }

    /// Merge all nodes and edges of `other` into this graph.
    pub fn merge(&mut self, other: &TrackGraph) -> Result<(), GraphError> {
        for (node, attributes) in &other.nodes {
            self.add_node(*node, attributes.clone())?;
        }
        for (edge, attributes) in &other.edges {
            self.add_edge(edge.clone(), attributes.clone())?;
        }
        debug!(
            component = "graph",
            operation = "merge",
            status = "success",
            num_nodes = self.nodes.len(),
            num_edges = self.edges.len(),
            "Merged graph"
        );
        Ok(())
    }

    // ── Metadata ────────────────────────────────────────────

    /// Drop the cached frame index. Every mutation calls this.
    pub fn invalidate(&mut self) {
        self.metadata.take();
    }

    /// Cached frame index, rebuilt if a mutation invalidated it.
    pub fn recompute_if_needed(&self) -> &FrameIndex {
        self.metadata.get_or_init(|| FrameIndex::build(self))
    }

    /// `(t_begin, t_end_exclusive)`, both `None` for an empty graph.
    pub fn get_frames(&self) -> (Option<i64>, Option<i64>) {
        match self.recompute_if_needed().frames() {
            Some((begin, end)) => (Some(begin), Some(end)),
            None => (None, None),
        }
    }

    /// Nodes in `frame`; empty if there are none.
    pub fn nodes_by_frame(&self, frame: i64) -> &[NodeId] {
        self.recompute_if_needed().nodes_by_frame(frame)
    }

    // ── Queries ─────────────────────────────────────────────

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Attributes)> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeId, &Attributes)> {
        self.edges.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = &EdgeId> {
        self.edges.keys()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn contains_edge(&self, edge: &EdgeId) -> bool {
        self.edges.contains_key(edge)
    }

    pub fn node_attrs(&self, node: NodeId) -> Option<&Attributes> {
        self.nodes.get(&node)
    }

    pub fn edge_attrs(&self, edge: &EdgeId) -> Option<&Attributes> {
        self.edges.get(edge)
    }

    /// Edges entering `node`.
    pub fn prev_edges(&self, node: NodeId) -> &[EdgeId] {
        self.prev_edges
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges leaving `node`.
    pub fn next_edges(&self, node: NodeId) -> &[EdgeId] {
        self.next_edges
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn frame_of(&self, node: NodeId) -> Option<i64> {
        self.nodes
            .get(&node)?
            .get(&self.frame_attribute)?
            .as_i64()
    }

    pub fn is_hyperedge(&self, edge: &EdgeId) -> bool {
        edge.is_hyperedge()
    }

    /// Incident plain node ids of `edge`.
    pub fn nodes_of(&self, edge: &EdgeId) -> Vec<NodeId> {
        edge.nodes()
    }

    // ── Validation helpers ──────────────────────────────────

    fn read_frame(&self, node: NodeId, attributes: &Attributes) -> Result<i64, GraphError> {
        let value = attributes
            .get(&self.frame_attribute)
            .ok_or_else(|| GraphError::MissingFrame {
                node,
                attribute: self.frame_attribute.clone(),
            })?;
        value.as_i64().ok_or_else(|| GraphError::InvalidFrame {
            node,
            attribute: self.frame_attribute.clone(),
        })
    }

    fn frame_or_zero(&self, node: NodeId) -> i64 {
        self.frame_of(node).unwrap_or_default()
    }

    fn check_forward(&self, edge: &EdgeId, source: i64, target: i64) -> Result<(), GraphError> {
        if source < target {
            Ok(())
        } else {
            Err(GraphError::NonForwardEdge {
                edge: edge.to_string(),
                source_frame: source,
                target_frame: target,
            })
        }
    }

    fn check_incident_edges(&self, node: NodeId, frame: i64) -> Result<(), GraphError> {
        let frame_with = |other: NodeId| {
            if other == node {
                frame
            } else {
                self.frame_or_zero(other)
            }
        };
        for edge in self.prev_edges(node).iter().chain(self.next_edges(node)) {
            if let EdgeId::Simple(source, target) = edge {
                self.check_forward(edge, frame_with(*source), frame_with(*target))?;
            }
        }
        Ok(())
    }
}
