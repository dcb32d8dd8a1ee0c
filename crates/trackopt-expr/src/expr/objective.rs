//! Compiled objectives.

use std::collections::BTreeMap;

use crate::expr::ast::{Expr, VarRef};
use crate::expr::coefficients::Coefficients;
use crate::expr::error::ExprError;
use crate::ids::VariableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    /// Lowercase sense name.
    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Minimize => "minimize",
            Sense::Maximize => "maximize",
        }
    }
}

/// Constant plus linear and quadratic coefficients, with a sense.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objective {
    sense: Sense,
    constant: f64,
    linear: BTreeMap<VariableId, f64>,
    quadratic: BTreeMap<(VariableId, VariableId), f64>,
}

impl Objective {
    /// Empty objective with `sense`.
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            ..Default::default()
        }
    }

    /// Objective from a dense coefficient vector. Zero entries are skipped.
    pub fn from_dense(sense: Sense, coefficients: &[f64]) -> Self {
        let mut objective = Objective::new(sense);
        for (position, coeff) in coefficients.iter().enumerate() {
            if *coeff == 0.0 {
                continue;
            }
            if let Some(id) = VariableId::from_index(position) {
                objective.linear.insert(id, *coeff);
            }
        }
        objective
    }

    /// Compiles an expression without comparisons.
    pub fn compile(expr: &Expr, sense: Sense) -> Result<Self, ExprError> {
        if expr.count_comparisons() > 0 {
            return Err(ExprError::ComparisonInObjective);
        }
        let coefficients = Coefficients::collect(expr)?;
        let mut objective = Objective::new(sense);
        objective.constant = coefficients.constant;
        for (var, coeff) in &coefficients.linear {
            if *coeff != 0.0 {
                objective.add_coefficient(resolve(var)?, *coeff);
            }
        }
        for ((a, b), coeff) in &coefficients.quadratic {
            if *coeff != 0.0 {
                objective.add_quadratic_coefficient(resolve(a)?, resolve(b)?, *coeff);
            }
        }
        Ok(objective)
    }

    /// Overwrite the constant offset.
    pub fn set_constant(&mut self, constant: f64) {
        self.constant = constant;
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

    /// Optimization sense.
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// Constant offset, not passed to backends as a column.
    pub fn constant(&self) -> f64 {
        self.constant
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

    /// Objective value at `values`, constant included.
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
        self.constant + linear + quadratic
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

    #[test]
    fn test_compile_linear_objective() {
        let expr = var("u", 0) - 2.0 * var("v", 1) + 3.0;
        let objective = Objective::compile(&expr, Sense::Maximize).unwrap();
        assert_eq!(objective.sense(), Sense::Maximize);
        assert_eq!(objective.constant(), 3.0);
        let coeffs: Vec<f64> = objective.linear().values().copied().collect();
        assert_eq!(coeffs, vec![1.0, -2.0]);
        assert_eq!(objective.evaluate(&[1.0, 1.0]), 2.0);
    }

    #[test]
    fn test_compile_quadratic_objective() {
        let (u, v, e) = (var("u", 0), var("v", 1), var("e", 2));
        let expr = -2.0 * u.clone() * u - 3.0 * v.clone() * e + 4.0 * v + 5.0;
        let objective = Objective::compile(&expr, Sense::Minimize).unwrap();
        let id = VariableId::new;
        assert_eq!(objective.quadratic()[&(id(0), id(0))], -2.0);
        assert_eq!(objective.quadratic()[&(id(1), id(2))], -3.0);
        assert_eq!(objective.linear()[&id(1)], 4.0);
        assert_eq!(objective.constant(), 5.0);
    }

    #[test]
    fn test_comparison_is_rejected() {
        let err = Objective::compile(&var("u", 0).le(1.0), Sense::Minimize).unwrap_err();
        assert_eq!(err, ExprError::ComparisonInObjective);
    }

    #[test]
    fn test_from_dense_skips_zeros() {
        let objective = Objective::from_dense(Sense::Minimize, &[0.0, -1.5, 0.0, 2.0]);
        assert_eq!(objective.linear().len(), 2);
        assert_eq!(objective.linear()[&VariableId::new(1)], -1.5);
        assert_eq!(objective.evaluate(&[1.0, 1.0, 1.0, 1.0]), 0.5);
    }
}
