//! Shared solver abstractions for trackopt.
//!
//! Backends (like `trackopt-highs`) consume an [`IlpProblem`] and produce a
//! [`Solution`]. Nothing here solves anything.
//!
//! # Overview
//!
//! - [`IlpProblem`]: variable count, domains, objective and constraints
//! - [`SolverConfig`]: time limit, threads, backend preference, events
//! - [`SolverStatus`]: common status values across solvers
//! - [`Solution`]: values in problem order plus status
//! - [`BackendError`]: error types for backend operations
//! - [`Backend`]: trait for solver implementations

mod config;
mod error;
mod events;
mod problem;
mod solution;
mod status;
mod traits;

pub use config::{BackendPreference, SolverConfig};
pub use error::BackendError;
pub use events::{EventCallback, SolverEvent};
pub use problem::{IlpProblem, VariableType};
pub use solution::Solution;
pub use status::SolverStatus;
pub use traits::Backend;
