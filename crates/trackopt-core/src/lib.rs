//! Multi-object tracking as integer linear programming.
//!
//! A [`TrackGraph`] holds detections over frames and candidate links. A
//! [`Solver`] session instantiates indicator variables on demand, collects
//! constraints and learnable costs, and hands the resulting ILP to any
//! [`trackopt_solver::Backend`].
//!
//! # Overview
//!
//! - [`graph`]: track graphs and their ingestion from a directed graph
//! - [`variables`]: indicator kinds and their index maps
//! - [`constraints`]: structural and user constraints
//! - [`costs`]: weighted features, weights and the feature matrix
//! - [`learning`]: fitting weights to partial ground truth
//! - [`utils`]: splitting a solution into tracks

pub mod constraints;
pub mod costs;
pub mod error;
pub mod graph;
pub mod learning;
pub mod logging;
pub mod solver;
pub mod utils;
pub mod variables;

pub use error::SolverError;
pub use graph::{AttrValue, Attributes, EdgeId, GraphError, GraphInput, NodeId, TrackGraph};
pub use learning::{LearningProblem, SubgradientLearner, WeightLearner};
pub use logging::enable_logging;
pub use solver::Solver;
pub use utils::get_tracks;
