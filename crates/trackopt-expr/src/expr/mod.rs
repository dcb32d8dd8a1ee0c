//! Expression types for optimization modeling.
//!
//! - `ast`: tagged expression tree and builders
//! - `coefficients`: coefficient extraction and canonical quadratic keys
//! - `constraint`: compiled comparison with relation and RHS
//! - `objective`: compiled expression with a sense
//! - `error`: compilation errors

pub mod ast;
pub mod coefficients;
pub mod constraint;
pub mod error;
pub mod objective;

pub use ast::{BinaryOp, CompareOp, Expr, UnaryOp, VarRef};
pub use coefficients::{Coefficients, canonical_pair};
pub use constraint::{Constraint, Relation};
pub use error::ExprError;
pub use objective::{Objective, Sense};
