//! Graph validation errors.

use crate::graph::ids::NodeId;

/// Errors raised while building or ingesting a [`crate::graph::TrackGraph`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A node lacks the frame attribute.
    MissingFrame { node: NodeId, attribute: String },
    /// The frame attribute is not an integer.
    InvalidFrame { node: NodeId, attribute: String },
    /// An ordinary edge does not point strictly forward in time.
    NonForwardEdge {
        edge: String,
        source_frame: i64,
        target_frame: i64,
    },
    /// An edge id mixes bare ids and tuples, or has an empty side.
    MalformedEdge(String),
    /// An edge refers to a node that was never added.
    UnknownNode { node: NodeId, edge: String },
    /// Input nodes exist but none carries the frame attribute.
    NoDetections { attribute: String },
    /// Input could not be parsed.
    InvalidInput(String),
}

impl GraphError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::MissingFrame { .. } => "GRAPH_MISSING_FRAME",
            GraphError::InvalidFrame { .. } => "GRAPH_INVALID_FRAME",
            GraphError::NonForwardEdge { .. } => "GRAPH_NON_FORWARD_EDGE",
            GraphError::MalformedEdge(_) => "GRAPH_INVALID_EDGE",
            GraphError::UnknownNode { .. } => "GRAPH_UNKNOWN_NODE",
            GraphError::NoDetections { .. } => "GRAPH_NO_DETECTIONS",
            GraphError::InvalidInput(_) => "GRAPH_INVALID_INPUT",
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::MissingFrame { node, attribute } => write!(
                f,
                "[{}] node {} has no frame attribute '{}'",
                self.code(),
                node,
                attribute
            ),
            GraphError::InvalidFrame { node, attribute } => write!(
                f,
                "[{}] frame attribute '{}' of node {} is not an integer",
                self.code(),
                attribute,
                node
            ),
            GraphError::NonForwardEdge {
                edge,
                source_frame,
                target_frame,
            } => write!(
                f,
                "[{}] edge {} goes from frame {} to frame {}; edges must point forward in time",
                self.code(),
                edge,
                source_frame,
                target_frame
            ),
            GraphError::MalformedEdge(detail) => {
                write!(f, "[{}] malformed edge id: {}", self.code(), detail)
            }
            GraphError::UnknownNode { node, edge } => write!(
                f,
                "[{}] edge {} refers to unknown node {}",
                self.code(),
                edge,
                node
            ),
            GraphError::NoDetections { attribute } => write!(
                f,
                "[{}] no input node has the frame attribute '{}'",
                self.code(),
                attribute
            ),
            GraphError::InvalidInput(detail) => {
                write!(f, "[{}] {}", self.code(), detail)
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::InvalidInput(err.to_string())
    }
}
