//! Backend trait for abstraction over ILP solvers.

use crate::{BackendError, IlpProblem, Solution, SolverConfig};

/// An external ILP solver.
///
/// Implementations translate an [`IlpProblem`] into their native model,
/// solve it and report values in problem order. Infeasible or unbounded
/// outcomes are returned as a [`Solution`] status, not as an error.
pub trait Backend {
    /// Short lowercase identifier matched against the configured preference.
    fn name(&self) -> &'static str;

    /// Solve `problem` under `config`.
    ///
    /// # Errors
    ///
    /// Returns a `BackendError` if:
    /// - The configured preference excludes this backend
    /// - The problem uses a feature the backend cannot express
    /// - The problem references unknown variables
    fn solve(
        &mut self,
        problem: &IlpProblem,
        config: &SolverConfig,
    ) -> Result<Solution, BackendError>;

    /// Fail early when the configured preference excludes this backend.
    fn ensure_selected(&self, config: &SolverConfig) -> Result<(), BackendError> {
        if config.backend.accepts(self.name()) {
            Ok(())
        } else {
            Err(BackendError::SolverNotAvailable {
                requested: config.backend.to_string(),
                available: self.name(),
            })
        }
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(
        &mut self,
        problem: &IlpProblem,
        config: &SolverConfig,
    ) -> Result<Solution, BackendError> {
        (**self).solve(problem, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackendPreference, SolverStatus};

    /// Selects every variable.
    struct AllOnes;

    impl Backend for AllOnes {
        fn name(&self) -> &'static str {
            "all_ones"
        }

        fn solve(
            &mut self,
            problem: &IlpProblem,
            config: &SolverConfig,
        ) -> Result<Solution, BackendError> {
            self.ensure_selected(config)?;
            let values = vec![1.0; problem.num_variables()];
            let objective = problem.objective().evaluate(&values);
            Ok(Solution::new(values, objective, SolverStatus::Optimal))
        }
    }

    #[test]
    fn test_backend_solves_in_problem_order() {
        let mut backend = AllOnes;
        let solution = backend
            .solve(&IlpProblem::new(3), &SolverConfig::new())
            .unwrap();
        assert_eq!(solution.values(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_preference_mismatch_is_reported() {
        let mut backend: Box<dyn Backend> = Box::new(AllOnes);
        let config = SolverConfig::new().with_backend(BackendPreference::named("gurobi"));
        let err = backend.solve(&IlpProblem::new(1), &config).unwrap_err();
        assert_eq!(
            err,
            BackendError::SolverNotAvailable {
                requested: "gurobi".to_string(),
                available: "all_ones",
            }
        );
    }
}
