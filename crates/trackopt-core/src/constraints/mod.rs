//! Constraints on the selected subgraph.

mod pin;
mod structural;

use trackopt_expr::{Constraint, Expr};

use crate::Solver;
use crate::error::SolverError;

pub use pin::{AttributeConstraint, Pin};
pub use structural::{
    ExclusiveNodes, InOutSymmetry, MaxChildren, MaxParents, MinTrackLength, SelectEdgeNodes,
};

/// A family of linear constraints derived from a session's graph and
/// variables.
pub trait SolverConstraint {
    fn name(&self) -> &'static str;

    /// Compile the constraints for `solver`, instantiating any variable
    /// kinds they need.
    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError>;
}

/// A user-built comparison over variable handles, added as-is.
///
/// Handles come from [`crate::variables::VariableMap::expr`].
#[derive(Debug, Clone)]
pub struct ExpressionConstraint {
    expr: Expr,
}

impl ExpressionConstraint {
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }
}

impl SolverConstraint for ExpressionConstraint {
    fn name(&self) -> &'static str {
        "ExpressionConstraint"
    }

    fn instantiate(&self, _solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        Ok(vec![Constraint::compile(&self.expr)?])
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use trackopt_expr::Relation;

    use super::*;
    use crate::attrs;
    use crate::graph::{NodeId, TrackGraph};
    use crate::variables::NodeSelected;

    #[test]
    fn test_expression_constraint_over_handles() {
        let mut graph = TrackGraph::default();
        graph.add_node(0u64, attrs! { "t" => 0 }).unwrap();
        graph.add_node(1u64, attrs! { "t" => 0 }).unwrap();
        let mut solver = Solver::without_core_constraints(graph);
        let nodes = solver.get_variables::<NodeSelected>().unwrap();

        let a = nodes.expr(&NodeId::new(0)).unwrap();
        let b = nodes.expr(&NodeId::new(1)).unwrap();
        solver
            .add_constraint(ExpressionConstraint::new((a + b).equals(1.0)))
            .unwrap();

        let constraint = &solver.constraints()[0];
        assert_eq!(constraint.relation(), Relation::Equal);
        assert_eq!(constraint.rhs(), 1.0);
        assert_eq!(constraint.linear().len(), 2);
    }

    #[test]
    fn test_expression_constraint_needs_a_comparison() {
        let mut solver = Solver::without_core_constraints(TrackGraph::default());
        let err = solver
            .add_constraint(ExpressionConstraint::new(Expr::constant(1.0)))
            .unwrap_err();
        assert_eq!(err.code(), "EXPR_MISSING_COMPARISON");
    }
}
