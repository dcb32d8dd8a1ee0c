//! Time-indexed candidate graph and its ingestion.

pub mod attrs;
pub mod error;
pub mod ids;
pub mod ingest;
pub mod track_graph;

pub use attrs::{AttrValue, Attributes};
pub use error::GraphError;
pub use ids::{EdgeId, Endpoint, NodeId};
pub use ingest::{GraphInput, IngestNode, InputEdge, InputNode};
pub use track_graph::{DEFAULT_FRAME_ATTRIBUTE, FrameIndex, TrackGraph};
