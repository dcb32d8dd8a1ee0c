//! The request handed to a backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trackopt_expr::{Constraint, Objective, VariableId};

use crate::BackendError;

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    #[default]
    Binary,
    Integer,
    Continuous,
}

/// Variable count, domains, objective and constraints of one ILP.
///
/// Variables are the dense range `0..num_variables`. Types default to
/// [`VariableType::Binary`]; only deviations are stored.
#[derive(Debug, Clone, Default)]
pub struct IlpProblem {
    num_variables: usize,
    variable_types: BTreeMap<VariableId, VariableType>,
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl IlpProblem {
    pub fn new(num_variables: usize) -> Self {
        Self {
            num_variables,
            ..Default::default()
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn set_variable_type(
        &mut self,
        id: VariableId,
        variable_type: VariableType,
    ) -> Result<(), BackendError> {
        self.ensure_variable(id)?;
        if variable_type == VariableType::Binary {
            self.variable_types.remove(&id);
        } else {
            self.variable_types.insert(id, variable_type);
        }
        Ok(())
    }

    pub fn variable_type(&self, id: VariableId) -> VariableType {
        self.variable_types.get(&id).copied().unwrap_or_default()
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn extend_constraints(&mut self, constraints: impl IntoIterator<Item = Constraint>) {
        self.constraints.extend(constraints);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether the objective or any constraint has quadratic terms.
    pub fn is_quadratic(&self) -> bool {
        self.objective.is_quadratic() || self.constraints.iter().any(Constraint::is_quadratic)
    }

    /// Check every referenced index and coefficient.
    pub fn validate(&self) -> Result<(), BackendError> {
        let objective_terms = self
            .objective
            .linear()
            .iter()
            .map(|(id, coeff)| (*id, *coeff));
        for (id, coeff) in objective_terms {
            self.ensure_variable(id)?;
            ensure_finite(coeff, "objective coefficient")?;
        }
        for ((a, b), coeff) in self.objective.quadratic() {
            self.ensure_variable(*a)?;
            self.ensure_variable(*b)?;
            ensure_finite(*coeff, "objective coefficient")?;
        }
        for constraint in &self.constraints {
            for (id, coeff) in constraint.linear() {
                self.ensure_variable(*id)?;
                ensure_finite(*coeff, "constraint coefficient")?;
            }
            for ((a, b), coeff) in constraint.quadratic() {
                self.ensure_variable(*a)?;
                self.ensure_variable(*b)?;
                ensure_finite(*coeff, "constraint coefficient")?;
            }
            ensure_finite(constraint.rhs(), "constraint right-hand side")?;
        }
        Ok(())
    }

    fn ensure_variable(&self, id: VariableId) -> Result<(), BackendError> {
        if id.index() < self.num_variables {
            Ok(())
        } else {
            Err(BackendError::InvalidVariableId(id.inner()))
        }
    }
}

fn ensure_finite(value: f64, what: &str) -> Result<(), BackendError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BackendError::InvalidProblem(format!("{what} {value} is not finite")))
    }
}

#[cfg(test)]
mod tests {
    use trackopt_expr::{Relation, Sense};

    use super::*;

    #[test]
    fn test_variable_types_default_to_binary() {
        let mut problem = IlpProblem::new(3);
        assert_eq!(problem.variable_type(VariableId::new(1)), VariableType::Binary);
        problem
            .set_variable_type(VariableId::new(1), VariableType::Continuous)
            .unwrap();
        assert_eq!(
            problem.variable_type(VariableId::new(1)),
            VariableType::Continuous
        );
        assert_eq!(
            problem.set_variable_type(VariableId::new(3), VariableType::Integer),
            Err(BackendError::InvalidVariableId(3))
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_indices() {
        let mut problem = IlpProblem::new(2);
        let mut constraint = Constraint::new(Relation::LessEqual, 1.0);
        constraint.set_coefficient(VariableId::new(5), 1.0);
        problem.add_constraint(constraint);
        assert_eq!(problem.validate(), Err(BackendError::InvalidVariableId(5)));
    }

    #[test]
    fn test_validate_rejects_non_finite_coefficients() {
        let mut problem = IlpProblem::new(1);
        problem.set_objective(Objective::from_dense(Sense::Minimize, &[f64::NAN]));
        let err = problem.validate().unwrap_err();
        assert_eq!(err.code(), "BACKEND_INVALID_PROBLEM");
    }

    #[test]
    fn test_quadratic_detection() {
        let mut problem = IlpProblem::new(2);
        assert!(!problem.is_quadratic());
        let mut constraint = Constraint::new(Relation::Equal, 0.0);
        constraint.add_quadratic_coefficient(VariableId::new(1), VariableId::new(0), 1.0);
        problem.add_constraint(constraint);
        assert!(problem.is_quadratic());
        assert!(problem.validate().is_ok());
    }
}
