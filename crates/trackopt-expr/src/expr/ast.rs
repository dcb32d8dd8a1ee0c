//! Expression tree over constants and variable references.
//!
//! Trees are built with the constructor functions on [`Expr`] or with the
//! arithmetic operators, which produce the same nodes.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::ids::VariableId;

/// A named reference to a decision variable.
///
/// Ordering compares the solver index first and the name second. This is
/// the canonical order used for quadratic term keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarRef {
    index: Option<VariableId>,
    name: String,
}

impl VarRef {
    /// Reference bound to a solver index.
    pub fn new(name: impl Into<String>, index: VariableId) -> Self {
        Self {
            index: Some(index),
            name: name.into(),
        }
    }

    /// Reference without a solver index. Compiling it fails.
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            index: None,
            name: name.into(),
        }
    }

    /// Bind this reference to solver index `index`.
    pub fn bind(mut self, index: VariableId) -> Self {
        self.index = Some(index);
        self
    }

    /// Display name of the referenced variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Solver index, `None` while unbound.
    pub fn index(&self) -> Option<VariableId> {
        self.index
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.index) {
            (false, _) => f.write_str(&self.name),
            (true, Some(index)) => write!(f, "{index}"),
            (true, None) => f.write_str("<unbound>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Operator symbol used by `Display`.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }
}

/// Relational operators an expression tree can hold.
///
/// Only `Le`, `Eq` and `Ge` compile into constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl CompareOp {
    /// Operator symbol used by `Display`.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Variable(VarRef),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    // ── Constructors ────────────────────────────────────────

    /// Constant leaf.
    pub fn constant(value: f64) -> Self {
        Expr::Constant(value)
    }

    /// Variable leaf.
    pub fn variable(var: VarRef) -> Self {
        Expr::Variable(var)
    }

    /// Unary node over `operand`.
    pub fn unary(op: UnaryOp, operand: impl Into<Expr>) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand.into()),
        }
    }

    /// Binary node `left op right`.
    pub fn binary(op: BinaryOp, left: impl Into<Expr>, right: impl Into<Expr>) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    /// Comparison node `left op right`.
    pub fn compare(op: CompareOp, left: impl Into<Expr>, right: impl Into<Expr>) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    /// Left-folded sum of `items`. The empty sum is the constant zero.
    pub fn sum<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        let mut items = items.into_iter();
        let Some(first) = items.next() else {
            return Expr::Constant(0.0);
        };
        items.fold(first.into(), |acc, item| acc + item)
    }

    // ── Comparisons ─────────────────────────────────────────

    /// `self <= rhs`.
    pub fn le(self, rhs: impl Into<Expr>) -> Self {
        Expr::compare(CompareOp::Le, self, rhs)
    }

    /// `self >= rhs`.
    pub fn ge(self, rhs: impl Into<Expr>) -> Self {
        Expr::compare(CompareOp::Ge, self, rhs)
    }

    /// `self == rhs`.
    pub fn equals(self, rhs: impl Into<Expr>) -> Self {
        Expr::compare(CompareOp::Eq, self, rhs)
    }

    /// `self < rhs`; compiling it fails.
    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        Expr::compare(CompareOp::Lt, self, rhs)
    }

    /// `self > rhs`; compiling it fails.
    pub fn gt(self, rhs: impl Into<Expr>) -> Self {
        Expr::compare(CompareOp::Gt, self, rhs)
    }

    /// `self != rhs`; compiling it fails.
    pub fn not_equals(self, rhs: impl Into<Expr>) -> Self {
        Expr::compare(CompareOp::Ne, self, rhs)
    }

    // ── Inspection ──────────────────────────────────────────

    /// Number of comparison nodes anywhere in the tree.
    pub fn count_comparisons(&self) -> usize {
        match self {
            Expr::Constant(_) | Expr::Variable(_) => 0,
            Expr::Unary { operand, .. } => operand.count_comparisons(),
            Expr::Binary { left, right, .. } => {
                left.count_comparisons() + right.count_comparisons()
            }
            Expr::Compare { left, right, .. } => {
                1 + left.count_comparisons() + right.count_comparisons()
            }
        }
    }

    /// All variable references in evaluation order, duplicates included.
    pub fn variables(&self) -> Vec<&VarRef> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a VarRef>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Variable(var) => out.push(var),
            Expr::Unary { operand, .. } => operand.collect_variables(out),
            Expr::Binary { left, right, .. } | Expr::Compare { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Compare { .. } => 0,
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => 3,
            Expr::Constant(_) | Expr::Variable(_) => 4,
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(value)
    }
}

impl From<VarRef> for Expr {
    fn from(var: VarRef) -> Self {
        Expr::Variable(var)
    }
}

impl From<&VarRef> for Expr {
    fn from(var: &VarRef) -> Self {
        Expr::Variable(var.clone())
    }
}

// ── Operators ───────────────────────────────────────────────

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Into<Expr>> $trait<T> for Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, Expr::Constant(self), rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

// ── Display ─────────────────────────────────────────────────

fn write_operand(
    f: &mut fmt::Formatter<'_>,
    child: &Expr,
    parent: u8,
    tight: bool,
) -> fmt::Result {
    let child_precedence = child.precedence();
    if child_precedence < parent || (tight && child_precedence == parent) {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Variable(var) => write!(f, "{var}"),
            Expr::Unary { op, operand } => {
                f.write_str(match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Pos => "+",
                })?;
                write_operand(f, operand, self.precedence(), false)
            }
            Expr::Binary { op, left, right } => {
                let precedence = op.precedence();
                write_operand(f, left, precedence, false)?;
                write!(f, " {} ", op.symbol())?;
                let tight = matches!(op, BinaryOp::Sub | BinaryOp::Div);
                write_operand(f, right, precedence, tight)
            }
            Expr::Compare { op, left, right } => {
                write_operand(f, left, 0, true)?;
                write!(f, " {op} ")?;
                write_operand(f, right, 0, true)
            }
        }
    }
}
