//! Symbolic expressions over solver variables and their compiled forms.

pub mod expr;
pub mod ids;

pub use expr::{
    BinaryOp, Coefficients, CompareOp, Constraint, Expr, ExprError, Objective, Relation, Sense,
    UnaryOp, VarRef, canonical_pair,
};
pub use ids::{ConstraintId, VariableId};
