//! Solver status types.

use serde::{Deserialize, Serialize};

/// Outcome reported by a backend for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Optimal solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Solver reached time limit; values hold the best solution found.
    ReachedTimeLimit,
    /// Solver reached iteration limit; values hold the best solution found.
    ReachedIterationLimit,
    /// Status is unknown or solver did not complete.
    Unknown,
}

impl SolverStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }

    /// Optimal, or stopped at a limit with a usable incumbent.
    pub fn is_feasible(self) -> bool {
        matches!(
            self,
            SolverStatus::Optimal
                | SolverStatus::ReachedTimeLimit
                | SolverStatus::ReachedIterationLimit
        )
    }

    /// Stopped at a limit: usable, but not proven optimal.
    pub fn is_degraded(self) -> bool {
        matches!(
            self,
            SolverStatus::ReachedTimeLimit | SolverStatus::ReachedIterationLimit
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::ReachedTimeLimit => "time_limit",
            SolverStatus::ReachedIterationLimit => "iteration_limit",
            SolverStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
