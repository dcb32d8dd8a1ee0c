//! Constraints fixing the selection of individual nodes and edges.

use std::fmt;
use std::rc::Rc;

use trackopt_expr::{Constraint, Relation, VariableId};

use crate::Solver;
use crate::constraints::SolverConstraint;
use crate::error::SolverError;
use crate::graph::{AttrValue, Attributes};
use crate::variables::{EdgeSelected, NodeSelected};

/// Indices forced to 1 and to 0, compiled into two equalities.
#[derive(Default)]
struct Pinned {
    select: Vec<VariableId>,
    exclude: Vec<VariableId>,
}

impl Pinned {
    fn record(&mut self, index: VariableId, verdict: Option<bool>) {
        match verdict {
            Some(true) => self.select.push(index),
            Some(false) => self.exclude.push(index),
            None => {}
        }
    }

    /// `sum(select) == |select|` and `sum(exclude) == 0`.
    fn into_constraints(self) -> Vec<Constraint> {
        let mut select = Constraint::new(Relation::Equal, self.select.len() as f64);
        for index in self.select {
            select.add_coefficient(index, 1.0);
        }
        let mut exclude = Constraint::new(Relation::Equal, 0.0);
        for index in self.exclude {
            exclude.add_coefficient(index, 1.0);
        }
        vec![select, exclude]
    }
}

fn pin_elements(
    solver: &mut Solver,
    on_nodes: bool,
    on_edges: bool,
    verdict: &dyn Fn(&Attributes) -> Option<bool>,
) -> Result<Vec<Constraint>, SolverError> {
    let mut pinned = Pinned::default();
    if on_nodes {
        let nodes = solver.get_variables::<NodeSelected>()?;
        for (node, attributes) in solver.graph().nodes() {
            pinned.record(nodes.get(node)?, verdict(attributes));
        }
    }
    if on_edges {
        let edges = solver.get_variables::<EdgeSelected>()?;
        for (edge, attributes) in solver.graph().edges() {
            pinned.record(edges.get(edge)?, verdict(attributes));
        }
    }
    Ok(pinned.into_constraints())
}

/// Fix nodes and edges carrying `attribute`: truthy values are selected,
/// falsy values are not. Elements without the attribute stay free.
///
/// Useful to complete a partially curated solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    attribute: String,
}

impl Pin {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

impl SolverConstraint for Pin {
    fn name(&self) -> &'static str {
        "Pin"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        pin_elements(solver, true, true, &|attributes: &Attributes| {
            attributes.get(&self.attribute).map(AttrValue::is_truthy)
        })
    }
}

type Predicate = Rc<dyn Fn(&Attributes) -> Option<bool>>;

/// Select or exclude elements by a predicate over their attributes.
///
/// `Some(true)` selects the element, `Some(false)` excludes it and `None`
/// leaves it free, e.g. when an attribute the predicate needs is missing.
///
/// ```
/// use trackopt_core::constraints::AttributeConstraint;
///
/// // Select frame-0 cells that are not green.
/// let constraint = AttributeConstraint::new(|attributes| {
///     let frame = attributes.get("t")?.as_i64()?;
///     let color = attributes.get("color")?.as_str()?;
///     Some(frame == 0 && color != "green")
/// })
/// .with_edges(false);
/// # let _ = constraint;
/// ```
#[derive(Clone)]
pub struct AttributeConstraint {
    predicate: Predicate,
    on_nodes: bool,
    on_edges: bool,
}

impl AttributeConstraint {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Attributes) -> Option<bool> + 'static,
    {
        Self {
            predicate: Rc::new(predicate),
            on_nodes: true,
            on_edges: true,
        }
    }

    pub fn with_nodes(mut self, enabled: bool) -> Self {
        self.on_nodes = enabled;
        self
    }

    pub fn with_edges(mut self, enabled: bool) -> Self {
        self.on_edges = enabled;
        self
    }
}

impl fmt::Debug for AttributeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeConstraint")
            .field("on_nodes", &self.on_nodes)
            .field("on_edges", &self.on_edges)
            .finish_non_exhaustive()
    }
}

impl SolverConstraint for AttributeConstraint {
    fn name(&self) -> &'static str {
        "AttributeConstraint"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        pin_elements(solver, self.on_nodes, self.on_edges, &*self.predicate)
    }
}
