//! Backend response.

use serde::{Deserialize, Serialize};
use trackopt_expr::VariableId;

use crate::SolverStatus;

/// Values indexed like the problem's variables, plus status and objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    values: Vec<f64>,
    objective_value: f64,
    status: SolverStatus,
    message: String,
    solve_time_seconds: f64,
}

impl Solution {
    pub fn new(values: Vec<f64>, objective_value: f64, status: SolverStatus) -> Self {
        Self {
            values,
            objective_value,
            status,
            message: status.as_str().to_string(),
            solve_time_seconds: 0.0,
        }
    }

    /// Trivially optimal solution of a problem without variables.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0.0, SolverStatus::Optimal)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_solve_time(mut self, seconds: f64) -> Self {
        self.solve_time_seconds = seconds;
        self
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, id: VariableId) -> Option<f64> {
        self.values.get(id.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    /// Human-readable status line from the backend.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn solve_time_seconds(&self) -> f64 {
        self.solve_time_seconds
    }

    pub fn is_feasible(&self) -> bool {
        self.status.is_feasible()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_value_lookup() {
        let solution = Solution::new(vec![1.0, 0.0], 2.5, SolverStatus::Optimal);
        assert_eq!(solution.value(VariableId::new(0)), Some(1.0));
        assert_eq!(solution.value(VariableId::new(2)), None);
        assert_eq!(solution.message(), "optimal");
        assert_eq!(solution.len(), 2);
    }

    #[test]
    fn test_time_limit_solution_is_distinguishable() {
        let solution = Solution::new(vec![1.0], 1.0, SolverStatus::ReachedTimeLimit)
            .with_message("time limit reached, returning incumbent");
        assert!(solution.is_feasible());
        assert!(solution.status().is_degraded());
        assert_ne!(solution.status(), SolverStatus::Optimal);
    }

    #[test]
    fn test_empty_solution() {
        let solution = Solution::empty();
        assert!(solution.is_empty());
        assert!(solution.status().is_optimal());
        assert_eq!(solution.objective_value(), 0.0);
    }
}
