//! Coefficient extraction from expression trees.
//!
//! The walk carries a running scale. Subtraction and the right side of a
//! comparison negate it, constant factors multiply it, and a product of
//! two non-constant factors is expanded into quadratic terms. The two
//! factors need not be distinct: `u * u` is kept as the square term
//! `(u, u)`.

use std::collections::BTreeMap;

use crate::expr::ast::{BinaryOp, Expr, UnaryOp, VarRef};
use crate::expr::error::ExprError;

/// Orders a variable pair so that `a*b` and `b*a` share one key. A square
/// `a*a` maps to `(a, a)`.
pub fn canonical_pair(a: &VarRef, b: &VarRef) -> (VarRef, VarRef) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Constant, linear and quadratic coefficients of an expression, keyed by
/// variable reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coefficients {
    pub constant: f64,
    pub linear: BTreeMap<VarRef, f64>,
    pub quadratic: BTreeMap<(VarRef, VarRef), f64>,
}

impl Coefficients {
    /// Collects coefficients with every term moved to the left side.
    ///
    /// A top-level comparison contributes its left side as-is and its right
    /// side negated. The relation itself is ignored here.
    pub fn collect(expr: &Expr) -> Result<Self, ExprError> {
        let comparisons = expr.count_comparisons();
        if comparisons > 1 {
            return Err(ExprError::MultipleComparisons { count: comparisons });
        }
        let mut out = Coefficients::default();
        match expr {
            Expr::Compare { left, right, .. } => {
                out.accumulate(left, 1.0)?;
                out.accumulate(right, -1.0)?;
            }
            other => out.accumulate(other, 1.0)?,
        }
        Ok(out)
    }

    /// Whether any quadratic coefficient is present.
    pub fn is_quadratic(&self) -> bool {
        !self.quadratic.is_empty()
    }

    fn accumulate(&mut self, expr: &Expr, scale: f64) -> Result<(), ExprError> {
        match expr {
            Expr::Constant(value) => {
                self.constant += scale * finite(*value)?;
            }
            Expr::Variable(var) => {
                *self.linear.entry(var.clone()).or_insert(0.0) += scale;
            }
            Expr::Unary { op, operand } => {
                let sign = match op {
                    UnaryOp::Neg => -1.0,
                    UnaryOp::Pos => 1.0,
                };
                self.accumulate(operand, sign * scale)?;
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOp::Add => {
                    self.accumulate(left, scale)?;
                    self.accumulate(right, scale)?;
                }
                BinaryOp::Sub => {
                    self.accumulate(left, scale)?;
                    self.accumulate(right, -scale)?;
                }
                BinaryOp::Mul => {
                    if let Some(factor) = constant_value(right)? {
                        self.accumulate(left, scale * factor)?;
                    } else if let Some(factor) = constant_value(left)? {
                        self.accumulate(right, scale * factor)?;
                    } else {
                        self.accumulate_product(left, right, scale)?;
                    }
                }
                BinaryOp::Div => {
                    let divisor = constant_value(right)?.ok_or(ExprError::DivisionByVariable)?;
                    if divisor == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    self.accumulate(left, scale / divisor)?;
                }
            },
            Expr::Compare { .. } => return Err(ExprError::MisplacedComparison),
        }
        Ok(())
    }

    fn accumulate_product(&mut self, left: &Expr, right: &Expr, scale: f64) -> Result<(), ExprError> {
        let mut lhs = Coefficients::default();
        lhs.accumulate(left, 1.0)?;
        let mut rhs = Coefficients::default();
        rhs.accumulate(right, 1.0)?;
        if lhs.is_quadratic() || rhs.is_quadratic() {
            return Err(ExprError::CubicTerm);
        }

        self.constant += scale * lhs.constant * rhs.constant;
        for (var, coeff) in &lhs.linear {
            *self.linear.entry(var.clone()).or_insert(0.0) += scale * coeff * rhs.constant;
        }
        for (var, coeff) in &rhs.linear {
            *self.linear.entry(var.clone()).or_insert(0.0) += scale * coeff * lhs.constant;
        }
        for (a, coeff_a) in &lhs.linear {
            for (b, coeff_b) in &rhs.linear {
                *self.quadratic.entry(canonical_pair(a, b)).or_insert(0.0) +=
                    scale * coeff_a * coeff_b;
            }
        }
        Ok(())
    }
}

fn finite(value: f64) -> Result<f64, ExprError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExprError::NonFiniteConstant(value))
    }
}

/// Evaluates a variable-free subtree. Returns `None` when the subtree
/// references a variable.
fn constant_value(expr: &Expr) -> Result<Option<f64>, ExprError> {
    let value = match expr {
        Expr::Constant(value) => Some(finite(*value)?),
        Expr::Variable(_) => None,
        Expr::Unary { op, operand } => constant_value(operand)?.map(|value| match op {
            UnaryOp::Neg => -value,
            UnaryOp::Pos => value,
        }),
        Expr::Binary { op, left, right } => {
            let (Some(left), Some(right)) = (constant_value(left)?, constant_value(right)?)
            else {
                return Ok(None);
            };
            match op {
                BinaryOp::Add => Some(left + right),
                BinaryOp::Sub => Some(left - right),
                BinaryOp::Mul => Some(left * right),
                BinaryOp::Div if right == 0.0 => return Err(ExprError::DivisionByZero),
                BinaryOp::Div => Some(left / right),
            }
        }
        Expr::Compare { .. } => return Err(ExprError::MisplacedComparison),
    };
    Ok(value)
}
