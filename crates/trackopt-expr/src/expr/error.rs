//! Expression compilation errors.

use crate::expr::ast::CompareOp;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    /// More than one comparison node in a single expression.
    MultipleComparisons { count: usize },
    /// A comparison operator other than `<=`, `==` or `>=`.
    UnsupportedOperator(CompareOp),
    /// A comparison nested below arithmetic.
    MisplacedComparison,
    /// A constraint expression without a comparison.
    MissingComparison,
    /// An objective expression containing a comparison.
    ComparisonInObjective,
    /// A product with more than two variable factors.
    CubicTerm,
    /// A variable reference without a solver index.
    UnboundVariable { name: String },
    /// A constant that is NaN or infinite.
    NonFiniteConstant(f64),
    DivisionByZero,
    DivisionByVariable,
}

impl ExprError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ExprError::MultipleComparisons { .. } => "EXPR_MULTIPLE_COMPARISONS",
            ExprError::UnsupportedOperator(_) => "EXPR_UNSUPPORTED_OPERATOR",
            ExprError::MisplacedComparison => "EXPR_MISPLACED_COMPARISON",
            ExprError::MissingComparison => "EXPR_MISSING_COMPARISON",
            ExprError::ComparisonInObjective => "EXPR_COMPARISON_IN_OBJECTIVE",
            ExprError::CubicTerm => "EXPR_CUBIC_TERM",
            ExprError::UnboundVariable { .. } => "EXPR_UNBOUND_VARIABLE",
            ExprError::NonFiniteConstant(_) => "EXPR_NON_FINITE_CONSTANT",
            ExprError::DivisionByZero => "EXPR_DIVISION_BY_ZERO",
            ExprError::DivisionByVariable => "EXPR_DIVISION_BY_VARIABLE",
        }
    }

    fn detail(&self) -> String {
        match self {
            ExprError::MultipleComparisons { count } => {
                format!("only single comparisons supported, found {count}")
            }
            ExprError::UnsupportedOperator(op) => {
                format!("unsupported operator '{op}' (expected <=, == or >=)")
            }
            ExprError::MisplacedComparison => {
                "comparison must be the outermost node of a constraint".to_string()
            }
            ExprError::MissingComparison => {
                "constraint expression has no comparison".to_string()
            }
            ExprError::ComparisonInObjective => {
                "objective expression must not contain a comparison".to_string()
            }
            ExprError::CubicTerm => "cannot multiply more than two variables".to_string(),
            ExprError::UnboundVariable { name } => {
                format!("variable '{name}' has no solver index")
            }
            ExprError::NonFiniteConstant(value) => {
                format!("constant {value} is not a finite number")
            }
            ExprError::DivisionByZero => "division by zero".to_string(),
            ExprError::DivisionByVariable => {
                "division is only supported by constant expressions".to_string()
            }
        }
    }
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.detail())
    }
}

impl std::error::Error for ExprError {}

#[cfg(test)]
mod tests {
    use super::ExprError;
    use crate::expr::ast::CompareOp;

    #[test]
    fn error_code_is_stable() {
        assert_eq!(ExprError::CubicTerm.code(), "EXPR_CUBIC_TERM");
        assert_eq!(
            ExprError::MultipleComparisons { count: 2 }.code(),
            "EXPR_MULTIPLE_COMPARISONS"
        );
        assert_eq!(
            ExprError::UnsupportedOperator(CompareOp::Ne).code(),
            "EXPR_UNSUPPORTED_OPERATOR"
        );
    }

    #[test]
    fn display_prefixes_error_code() {
        let rendered = ExprError::CubicTerm.to_string();
        assert_eq!(
            rendered,
            "[EXPR_CUBIC_TERM] cannot multiply more than two variables"
        );
        let rendered = ExprError::UnsupportedOperator(CompareOp::Lt).to_string();
        assert!(rendered.contains("'<'"));
    }
}
