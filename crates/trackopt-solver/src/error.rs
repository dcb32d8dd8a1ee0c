//! Backend error types.

/// Errors raised by an ILP backend before or while solving.
///
/// Infeasible and unbounded outcomes are not errors: they are reported
/// through [`crate::SolverStatus`] on the returned solution.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The configured preference names a backend other than this one.
    SolverNotAvailable {
        requested: String,
        available: &'static str,
    },
    /// The problem uses a feature the backend cannot express.
    Unsupported(String),
    /// A coefficient refers to a variable outside the problem.
    InvalidVariableId(u32),
    /// Malformed problem data such as a non-finite coefficient.
    InvalidProblem(String),
    /// Internal backend failure.
    Internal(String),
}

impl BackendError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::SolverNotAvailable { .. } => "BACKEND_NOT_AVAILABLE",
            BackendError::Unsupported(_) => "BACKEND_UNSUPPORTED",
            BackendError::InvalidVariableId(_) => "BACKEND_INVALID_VARIABLE",
            BackendError::InvalidProblem(_) => "BACKEND_INVALID_PROBLEM",
            BackendError::Internal(_) => "BACKEND_INTERNAL",
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::SolverNotAvailable {
                requested,
                available,
            } => write!(
                f,
                "[{}] requested backend '{}' but only '{}' is available",
                self.code(),
                requested,
                available
            ),
            BackendError::Unsupported(feature) => {
                write!(f, "[{}] unsupported: {}", self.code(), feature)
            }
            BackendError::InvalidVariableId(id) => {
                write!(f, "[{}] variable x{} is out of range", self.code(), id)
            }
            BackendError::InvalidProblem(msg) => {
                write!(f, "[{}] invalid problem: {}", self.code(), msg)
            }
            BackendError::Internal(msg) => {
                write!(f, "[{}] backend internal error: {}", self.code(), msg)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BackendError::Unsupported("quadratic".into()).code(),
            "BACKEND_UNSUPPORTED"
        );
        assert_eq!(
            BackendError::InvalidVariableId(3).code(),
            "BACKEND_INVALID_VARIABLE"
        );
    }

    #[test]
    fn test_display_names_backends() {
        let err = BackendError::SolverNotAvailable {
            requested: "gurobi".to_string(),
            available: "highs",
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[BACKEND_NOT_AVAILABLE]"));
        assert!(msg.contains("gurobi"));
        assert!(msg.contains("highs"));
    }
}
