//! Session-level errors.

use trackopt_expr::ExprError;
use trackopt_solver::BackendError;

use crate::graph::GraphError;

/// Errors raised by a [`crate::Solver`] session and its costs, constraints
/// and variable kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// A cost with this name is already registered.
    DuplicateCost(String),
    /// No solution is available yet.
    NoSolution,
    /// The solution predates variables added since the last solve.
    StaleSolution { solution_len: usize, num_variables: usize },
    /// No node or edge carries the ground-truth attribute.
    MissingGroundTruth(String),
    /// A variable kind was used before being instantiated.
    KindNotInstantiated(&'static str),
    /// A key has no variable of the given kind.
    UnknownKey { kind: &'static str, key: String },
    /// A cost needs a numeric attribute an element lacks.
    MissingAttribute { element: String, attribute: String },
    /// A weight was used before being registered with the session.
    UnregisteredWeight,
    /// A weight vector does not match the number of registered weights.
    WeightCountMismatch { expected: usize, actual: usize },
    /// A constraint was configured with unsupported parameters.
    InvalidConstraint(String),
    Graph(GraphError),
    Expr(ExprError),
    Backend(BackendError),
}

impl SolverError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::DuplicateCost(_) => "SOLVER_DUPLICATE_COST",
            SolverError::NoSolution => "SOLVER_NO_SOLUTION",
            SolverError::StaleSolution { .. } => "SOLVER_STALE_SOLUTION",
            SolverError::MissingGroundTruth(_) => "SOLVER_MISSING_GROUND_TRUTH",
            SolverError::KindNotInstantiated(_) => "SOLVER_KIND_NOT_INSTANTIATED",
            SolverError::UnknownKey { .. } => "SOLVER_UNKNOWN_KEY",
            SolverError::MissingAttribute { .. } => "SOLVER_MISSING_ATTRIBUTE",
            SolverError::UnregisteredWeight => "SOLVER_UNREGISTERED_WEIGHT",
            SolverError::WeightCountMismatch { .. } => "SOLVER_WEIGHT_COUNT_MISMATCH",
            SolverError::InvalidConstraint(_) => "SOLVER_INVALID_CONSTRAINT",
            SolverError::Graph(err) => err.code(),
            SolverError::Expr(err) => err.code(),
            SolverError::Backend(err) => err.code(),
        }
    }
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::DuplicateCost(name) => write!(
                f,
                "[{}] a cost named '{}' is already registered",
                self.code(),
                name
            ),
            SolverError::NoSolution => {
                write!(f, "[{}] no solution available, call solve() first", self.code())
            }
            SolverError::StaleSolution {
                solution_len,
                num_variables,
            } => write!(
                f,
                "[{}] solution has {} values but the session has {} variables",
                self.code(),
                solution_len,
                num_variables
            ),
            SolverError::MissingGroundTruth(attribute) => write!(
                f,
                "[{}] no node or edge has the ground-truth attribute '{}'",
                self.code(),
                attribute
            ),
            SolverError::KindNotInstantiated(kind) => {
                write!(f, "[{}] variable kind {} is not instantiated", self.code(), kind)
            }
            SolverError::UnknownKey { kind, key } => {
                write!(f, "[{}] {} has no variable for {}", self.code(), kind, key)
            }
            SolverError::MissingAttribute { element, attribute } => write!(
                f,
                "[{}] {} has no numeric attribute '{}'",
                self.code(),
                element,
                attribute
            ),
            SolverError::UnregisteredWeight => {
                write!(f, "[{}] weight is not registered with the solver", self.code())
            }
            SolverError::WeightCountMismatch { expected, actual } => write!(
                f,
                "[{}] expected {} weight values, got {}",
                self.code(),
                expected,
                actual
            ),
            SolverError::InvalidConstraint(detail) => write!(f, "[{}] {}", self.code(), detail),
            SolverError::Graph(err) => write!(f, "{err}"),
            SolverError::Expr(err) => write!(f, "{err}"),
            SolverError::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Graph(err) => Some(err),
            SolverError::Expr(err) => Some(err),
            SolverError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for SolverError {
    fn from(err: GraphError) -> Self {
        SolverError::Graph(err)
    }
}

impl From<ExprError> for SolverError {
    fn from(err: ExprError) -> Self {
        SolverError::Expr(err)
    }
}

impl From<BackendError> for SolverError {
    fn from(err: BackendError) -> Self {
        SolverError::Backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_code() {
        let err: SolverError = ExprError::DivisionByZero.into();
        assert_eq!(err.code(), "EXPR_DIVISION_BY_ZERO");
        let err: SolverError = BackendError::Unsupported("quadratic".to_string()).into();
        assert_eq!(err.code(), "BACKEND_UNSUPPORTED");
    }

    #[test]
    fn test_display_includes_code() {
        let err = SolverError::DuplicateCost("Appear".to_string());
        assert_eq!(
            err.to_string(),
            "[SOLVER_DUPLICATE_COST] a cost named 'Appear' is already registered"
        );
    }
}
