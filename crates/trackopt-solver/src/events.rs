//! Progress events emitted by backends.

use std::sync::Arc;

use crate::SolverStatus;

/// Callback invoked synchronously for every [`SolverEvent`].
pub type EventCallback = Arc<dyn Fn(&SolverEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum SolverEvent {
    /// The backend built its model and is about to solve.
    Started {
        backend: &'static str,
        num_variables: usize,
        num_constraints: usize,
    },
    /// The backend returned.
    Finished {
        status: SolverStatus,
        objective_value: f64,
        solve_time_seconds: f64,
    },
}
