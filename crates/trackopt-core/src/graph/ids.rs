//! Node and edge identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::error::GraphError;

/// Identifier of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn inner(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One side of an edge in its nested form: a bare id or a tuple of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

/// An ordinary edge `(u, v)` or a hyperedge `((ins...), (outs...))`.
///
/// A hyperedge with several outputs is a division, with several inputs a
/// merge. Hyperedge sides are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(Endpoint, Endpoint)", into = "(Endpoint, Endpoint)")]
pub enum EdgeId {
    Simple(NodeId, NodeId),
    Hyper { ins: Vec<NodeId>, outs: Vec<NodeId> },
}

impl EdgeId {
    pub fn simple(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        EdgeId::Simple(source.into(), target.into())
    }

    /// Hyperedge from its two sides.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedEdge`] when a side is empty.
    pub fn hyper<I, O, T>(ins: I, outs: O) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = T>,
        O: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        let ins: Vec<NodeId> = ins.into_iter().map(Into::into).collect();
        let outs: Vec<NodeId> = outs.into_iter().map(Into::into).collect();
        if ins.is_empty() || outs.is_empty() {
            return Err(GraphError::MalformedEdge(format!(
                "hyperedge sides must not be empty (got {} inputs, {} outputs)",
                ins.len(),
                outs.len()
            )));
        }
        Ok(EdgeId::Hyper { ins, outs })
    }

    /// Edge id from its nested form.
    ///
    /// Both sides must be bare ids (ordinary edge) or both tuples (hyperedge).
    pub fn from_endpoints(source: Endpoint, target: Endpoint) -> Result<Self, GraphError> {
        match (source, target) {
            (Endpoint::Node(u), Endpoint::Node(v)) => Ok(EdgeId::Simple(u, v)),
            (Endpoint::Nodes(ins), Endpoint::Nodes(outs)) => EdgeId::hyper(ins, outs),
            (source, target) => Err(GraphError::MalformedEdge(format!(
                "cannot mix a bare node id and a node tuple: ({source:?}, {target:?})"
            ))),
        }
    }

    pub fn is_hyperedge(&self) -> bool {
        matches!(self, EdgeId::Hyper { .. })
    }

    /// Nodes on the incoming side.
    pub fn in_nodes(&self) -> Vec<NodeId> {
        match self {
            EdgeId::Simple(u, _) => vec![*u],
            EdgeId::Hyper { ins, .. } => ins.clone(),
        }
    }

    /// Nodes on the outgoing side.
    pub fn out_nodes(&self) -> Vec<NodeId> {
        match self {
            EdgeId::Simple(_, v) => vec![*v],
            EdgeId::Hyper { outs, .. } => outs.clone(),
        }
    }

    /// All incident nodes, incoming side first, without duplicates.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.in_nodes();
        for node in self.out_nodes() {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
        nodes
    }
}

impl TryFrom<(Endpoint, Endpoint)> for EdgeId {
    type Error = GraphError;

    fn try_from((source, target): (Endpoint, Endpoint)) -> Result<Self, Self::Error> {
        EdgeId::from_endpoints(source, target)
    }
}

impl From<EdgeId> for (Endpoint, Endpoint) {
    fn from(edge: EdgeId) -> Self {
        match edge {
            EdgeId::Simple(u, v) => (Endpoint::Node(u), Endpoint::Node(v)),
            EdgeId::Hyper { ins, outs } => (Endpoint::Nodes(ins), Endpoint::Nodes(outs)),
        }
    }
}

fn write_tuple(f: &mut fmt::Formatter<'_>, nodes: &[NodeId]) -> fmt::Result {
    f.write_str("(")?;
    for (position, node) in nodes.iter().enumerate() {
        if position > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{node}")?;
    }
    f.write_str(")")
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeId::Simple(u, v) => write!(f, "({u}, {v})"),
            EdgeId::Hyper { ins, outs } => {
                f.write_str("(")?;
                write_tuple(f, ins)?;
                f.write_str(", ")?;
                write_tuple(f, outs)?;
                f.write_str(")")
            }
        }
    }
}
