//! Compiled constraints: coefficient maps with a relation and a right-hand side.

use std::collections::BTreeMap;
use std::fmt;

use crate::expr::ast::{CompareOp, Expr, VarRef};
use crate::expr::coefficients::Coefficients;
use crate::expr::error::ExprError;
use crate::ids::VariableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    LessEqual,
    Equal,
    GreaterEqual,
}

impl Relation {
    /// Relation symbol, e.g. `"<="`.
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::LessEqual => "<=",
            Relation::Equal => "==",
            Relation::GreaterEqual => ">=",
        }
    }

    /// Maps a comparison operator onto a supported relation.
    pub fn from_operator(op: CompareOp) -> Result<Self, ExprError> {
        match op {
            CompareOp::Le => Ok(Relation::LessEqual),
            CompareOp::Eq => Ok(Relation::Equal),
            CompareOp::Ge => Ok(Relation::GreaterEqual),
            other => Err(ExprError::UnsupportedOperator(other)),
        }
    }

    /// Whether `lhs relation rhs` holds within `tolerance`.
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Relation::LessEqual => lhs <= rhs + tolerance,
            Relation::Equal => (lhs - rhs).abs() <= tolerance,
            Relation::GreaterEqual => lhs + tolerance >= rhs,
        }
    }
}

/// Solver-ready constraint `Σ a_i x_i + Σ q_ij x_i x_j  (<=|==|>=)  rhs`.
///
/// Quadratic keys are ordered pairs with the smaller index first.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    linear: BTreeMap<VariableId, f64>,
    quadratic: BTreeMap<(VariableId, VariableId), f64>,
    relation: Relation,
    rhs: f64,
}

impl Constraint {
    /// Empty constraint, filled with [`Constraint::set_coefficient`].
    pub fn new(relation: Relation, rhs: f64) -> Self {
        Self {
            linear: BTreeMap::new(),
            quadratic: BTreeMap::new(),
            relation,
            rhs,
        }
    }

    /// Compiles a single top-level comparison.
    ///
    /// Every term is moved to the left side and the negated constant becomes
    /// the right-hand side.
    pub fn compile(expr: &Expr) -> Result<Self, ExprError> {
        let comparisons = expr.count_comparisons();
        if comparisons > 1 {
            return Err(ExprError::MultipleComparisons { count: comparisons });
        }
        let Expr::Compare { op, .. } = expr else {
            return Err(if comparisons == 0 {
                ExprError::MissingComparison
            } else {
                ExprError::MisplacedComparison
            });
        };
        let relation = Relation::from_operator(*op)?;
        let coefficients = Coefficients::collect(expr)?;

        let mut constraint = Constraint::new(relation, -coefficients.constant);
        for (var, coeff) in &coefficients.linear {
            constraint.add_coefficient(resolve(var)?, *coeff);
        }
        for ((a, b), coeff) in &coefficients.quadratic {
            constraint.add_quadratic_coefficient(resolve(a)?, resolve(b)?, *coeff);
        }
        constraint.drop_zeros();
        Ok(constraint)
    }

    /// Overwrite the linear coefficient of `index`.
    pub fn set_coefficient(&mut self, index: VariableId, coeff: f64) {
        self.linear.insert(index, coeff);
    }

    /// Accumulate `coeff` into the linear coefficient of `index`.
    pub fn add_coefficient(&mut self, index: VariableId, coeff: f64) {
        *self.linear.entry(index).or_insert(0.0) += coeff;
    }

    /// Accumulate `coeff` into the quadratic term of the ordered pair `(a, b)`.
    pub fn add_quadratic_coefficient(&mut self, a: VariableId, b: VariableId, coeff: f64) {
        let key = if a <= b { (a, b) } else { (b, a) };
        *self.quadratic.entry(key).or_insert(0.0) += coeff;
    }

    fn drop_zeros(&mut self) {
        self.linear.retain(|_, coeff| *coeff != 0.0);
        self.quadratic.retain(|_, coeff| *coeff != 0.0);
    }

    /// Linear coefficients by variable index.
    pub fn linear(&self) -> &BTreeMap<VariableId, f64> {
        &self.linear
    }

    /// Quadratic coefficients keyed by ordered index pairs.
    pub fn quadratic(&self) -> &BTreeMap<(VariableId, VariableId), f64> {
        &self.quadratic
    }

    /// Whether any quadratic term is present.
    pub fn is_quadratic(&self) -> bool {
        !self.quadratic.is_empty()
    }

    /// Relation between the left-hand side and [`Constraint::rhs`].
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Right-hand side constant.
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Left-hand side evaluated at `values`. Missing indices count as zero.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let value_of = |id: &VariableId| values.get(id.index()).copied().unwrap_or(0.0);
        let linear: f64 = self
            .linear
            .iter()
            .map(|(id, coeff)| coeff * value_of(id))
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .map(|((a, b), coeff)| coeff * value_of(a) * value_of(b))
            .sum();
        linear + quadratic
    }

    /// Whether `values` satisfy this constraint within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.relation
            .holds(self.evaluate(values), self.rhs, tolerance)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let terms = self
            .quadratic
            .iter()
            .map(|((a, b), coeff)| (*coeff, format!("{a}*{b}")))
            .chain(self.linear.iter().map(|(id, coeff)| (*coeff, id.to_string())));
        for (coeff, name) in terms {
            let sign = if coeff < 0.0 { "-" } else { "+" };
            if first {
                if coeff < 0.0 {
                    f.write_str("-")?;
                }
                first = false;
            } else {
                write!(f, " {sign} ")?;
            }
            write!(f, "{}*{name}", coeff.abs())?;
        }
        if first {
            f.write_str("0")?;
        }
        write!(f, " {} {}", self.relation.as_str(), self.rhs)
    }
}

fn resolve(var: &VarRef) -> Result<VariableId, ExprError> {
    var.index().ok_or_else(|| ExprError::UnboundVariable {
        name: var.name().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn var(name: &str, index: u32) -> Expr {
        Expr::from(VarRef::new(name, VariableId::new(index)))
    }

    fn id(index: u32) -> VariableId {
        VariableId::new(index)
    }

    #[test]
    fn test_square_compiles_to_diagonal_term() {
        let u = var("u", 4);
        let constraint = Constraint::compile(&(u.clone() * u).le(1.0)).unwrap();
        assert_eq!(constraint.quadratic().len(), 1);
        assert_eq!(constraint.quadratic()[&(id(4), id(4))], 1.0);
        assert!(constraint.linear().is_empty());
    }

    #[test]
    fn test_compile_linear_le() {
        let (u, v, e) = (var("u", 0), var("v", 1), var("e", 2));
        let constraint = Constraint::compile(&(2.0 * u - 5.0 * v + e / 2.0).le(-3.0)).unwrap();
        assert_eq!(constraint.relation(), Relation::LessEqual);
        assert_eq!(constraint.rhs(), 3.0);
        assert_eq!(constraint.linear().len(), 3);
        assert_eq!(constraint.linear()[&id(0)], 2.0);
        assert_eq!(constraint.linear()[&id(1)], -5.0);
        assert_eq!(constraint.linear()[&id(2)], 0.5);
        assert!(!constraint.is_quadratic());
    }

    #[test]
    fn test_compile_equality_between_variables() {
        let constraint = Constraint::compile(&var("u", 4).equals(var("v", 7))).unwrap();
        assert_eq!(constraint.relation(), Relation::Equal);
        assert_eq!(constraint.rhs(), 0.0);
        assert_eq!(constraint.linear()[&id(4)], 1.0);
        assert_eq!(constraint.linear()[&id(7)], -1.0);
    }

    #[test]
    fn test_compile_sum_against_constant() {
        let x = Expr::sum([var("x1", 1), var("x2", 2), var("x3", 3)]);
        let constraint = Constraint::compile(&(10.0 * var("a", 0) - x).le(9.0)).unwrap();
        assert_eq!(constraint.rhs(), 9.0);
        assert_eq!(constraint.linear()[&id(0)], 10.0);
        assert_eq!(constraint.linear()[&id(3)], -1.0);
    }

    #[test]
    fn test_compile_quadratic_keys_are_sorted() {
        let constraint =
            Constraint::compile(&(var("b", 5) * var("a", 2)).ge(1.0)).unwrap();
        assert_eq!(constraint.quadratic()[&(id(2), id(5))], 1.0);
        assert_eq!(constraint.rhs(), 1.0);
    }

    #[test]
    fn test_compile_drops_cancelled_terms() {
        let constraint =
            Constraint::compile(&(var("u", 0) - var("u", 0) + var("v", 1)).equals(1.0)).unwrap();
        assert_eq!(constraint.linear().len(), 1);
        assert!(constraint.linear().contains_key(&id(1)));
    }

    #[test]
    fn test_unsupported_operators() {
        for expr in [
            var("u", 0).not_equals(1.0),
            var("u", 0).lt(1.0),
            var("u", 0).gt(1.0),
        ] {
            let err = Constraint::compile(&expr).unwrap_err();
            assert_eq!(err.code(), "EXPR_UNSUPPORTED_OPERATOR");
        }
    }

    #[test]
    fn test_missing_and_misplaced_comparison() {
        assert_eq!(
            Constraint::compile(&(var("u", 0) + 1.0)).unwrap_err(),
            ExprError::MissingComparison
        );
        assert_eq!(
            Constraint::compile(&(var("u", 0).le(1.0) * 2.0)).unwrap_err(),
            ExprError::MisplacedComparison
        );
    }

    #[test]
    fn test_unbound_variable_is_rejected() {
        let expr = Expr::from(VarRef::unbound("w")).le(1.0);
        let err = Constraint::compile(&expr).unwrap_err();
        assert_eq!(
            err,
            ExprError::UnboundVariable {
                name: "w".to_string()
            }
        );
    }

    #[test]
    fn test_manual_constraint_and_evaluation() {
        let mut constraint = Constraint::new(Relation::LessEqual, 1.0);
        constraint.set_coefficient(id(0), 1.0);
        constraint.add_coefficient(id(1), 1.0);
        assert!(constraint.is_satisfied(&[1.0, 0.0], 1e-9));
        assert!(!constraint.is_satisfied(&[1.0, 1.0], 1e-9));
        assert_eq!(constraint.to_string(), "1*x0 + 1*x1 <= 1");
    }

    #[test]
    fn test_relation_holds() {
        assert!(Relation::Equal.holds(1.0 + 1e-9, 1.0, 1e-6));
        assert!(Relation::GreaterEqual.holds(2.0, 1.0, 0.0));
        assert!(!Relation::LessEqual.holds(2.0, 1.0, 0.0));
    }
}
