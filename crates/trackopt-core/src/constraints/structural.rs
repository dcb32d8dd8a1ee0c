//! Structural constraints on parents, children and track shape.

use trackopt_expr::{Constraint, Expr, Relation};

use crate::Solver;
use crate::constraints::SolverConstraint;
use crate::error::SolverError;
use crate::graph::NodeId;
use crate::variables::{EdgeSelected, NodeAppear, NodeSelected};

/// A selected edge implies its incident nodes are selected.
///
/// For an edge with `k` incident nodes: `k * x_edge - sum(x_node) <= 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectEdgeNodes;

impl SolverConstraint for SelectEdgeNodes {
    fn name(&self) -> &'static str {
        "SelectEdgeNodes"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        let nodes = solver.get_variables::<NodeSelected>()?;
        let edges = solver.get_variables::<EdgeSelected>()?;

        let mut constraints = Vec::with_capacity(edges.len());
        for (edge, x_edge) in edges.iter() {
            let incident = edge.nodes();
            let mut constraint = Constraint::new(Relation::LessEqual, 0.0);
            constraint.add_coefficient(x_edge, incident.len() as f64);
            for node in &incident {
                constraint.add_coefficient(nodes.get(node)?, -1.0);
            }
            constraints.push(constraint);
        }
        Ok(constraints)
    }
}

/// At most `n` selected incoming edges per node. A hyperedge counts once.
#[derive(Debug, Clone, Copy)]
pub struct MaxParents(pub u32);

impl SolverConstraint for MaxParents {
    fn name(&self) -> &'static str {
        "MaxParents"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        let edges = solver.get_variables::<EdgeSelected>()?;
        let graph = solver.graph();
        graph
            .node_ids()
            .map(|node| -> Result<Constraint, SolverError> {
                let incoming = graph
                    .prev_edges(node)
                    .iter()
                    .map(|edge| edges.expr(edge))
                    .collect::<Result<Vec<Expr>, _>>()?;
                Ok(Constraint::compile(&Expr::sum(incoming).le(f64::from(self.0)))?)
            })
            .collect()
    }
}

/// At most `n` selected outgoing edges per node. A hyperedge counts once.
#[derive(Debug, Clone, Copy)]
pub struct MaxChildren(pub u32);

impl SolverConstraint for MaxChildren {
    fn name(&self) -> &'static str {
        "MaxChildren"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        let edges = solver.get_variables::<EdgeSelected>()?;
        let graph = solver.graph();
        graph
            .node_ids()
            .map(|node| -> Result<Constraint, SolverError> {
                let outgoing = graph
                    .next_edges(node)
                    .iter()
                    .map(|edge| edges.expr(edge))
                    .collect::<Result<Vec<Expr>, _>>()?;
                Ok(Constraint::compile(&Expr::sum(outgoing).le(f64::from(self.0)))?)
            })
            .collect()
    }
}

/// At most one node per set is selected.
#[derive(Debug, Clone, Default)]
pub struct ExclusiveNodes {
    sets: Vec<Vec<NodeId>>,
}

impl ExclusiveNodes {
    pub fn new<S, I, N>(sets: S) -> Self
    where
        S: IntoIterator<Item = I>,
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        Self {
            sets: sets
                .into_iter()
                .map(|set| set.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

impl SolverConstraint for ExclusiveNodes {
    fn name(&self) -> &'static str {
        "ExclusiveNodes"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        let nodes = solver.get_variables::<NodeSelected>()?;
        self.sets
            .iter()
            .map(|set| -> Result<Constraint, SolverError> {
                let members = set
                    .iter()
                    .map(|node| nodes.expr(node))
                    .collect::<Result<Vec<Expr>, _>>()?;
                Ok(Constraint::compile(&Expr::sum(members).le(1.0))?)
            })
            .collect()
    }
}

/// Nodes strictly between the first and last frame have as many selected
/// incoming as outgoing edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct InOutSymmetry;

impl SolverConstraint for InOutSymmetry {
    fn name(&self) -> &'static str {
        "InOutSymmetry"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        let edges = solver.get_variables::<EdgeSelected>()?;
        let graph = solver.graph();
        let (Some(begin), Some(end)) = graph.get_frames() else {
            return Ok(Vec::new());
        };

        let mut constraints = Vec::new();
        for node in graph.node_ids() {
            let Some(frame) = graph.frame_of(node) else {
                continue;
            };
            if frame == begin || frame == end - 1 {
                continue;
            }
            let mut constraint = Constraint::new(Relation::Equal, 0.0);
            for edge in graph.prev_edges(node) {
                constraint.add_coefficient(edges.get(edge)?, 1.0);
            }
            for edge in graph.next_edges(node) {
                constraint.add_coefficient(edges.get(edge)?, -1.0);
            }
            constraints.push(constraint);
        }
        Ok(constraints)
    }
}

/// Every track that appears has at least `min_edges` edges.
///
/// Only a minimum of one edge is supported: `x_appear - sum(x_next) <= 0`.
#[derive(Debug, Clone, Copy)]
pub struct MinTrackLength {
    min_edges: u32,
}

impl MinTrackLength {
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConstraint`] for any `min_edges` other
    /// than 1.
    pub fn new(min_edges: u32) -> Result<Self, SolverError> {
        if min_edges != 1 {
            return Err(SolverError::InvalidConstraint(format!(
                "MinTrackLength supports a minimum of 1 edge, got {min_edges}"
            )));
        }
        Ok(Self { min_edges })
    }

    pub fn min_edges(&self) -> u32 {
        self.min_edges
    }
}

impl SolverConstraint for MinTrackLength {
    fn name(&self) -> &'static str {
        "MinTrackLength"
    }

    fn instantiate(&self, solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        let appear = solver.get_variables::<NodeAppear>()?;
        let edges = solver.get_variables::<EdgeSelected>()?;
        let graph = solver.graph();

        let mut constraints = Vec::with_capacity(appear.len());
        for (node, x_appear) in appear.iter() {
            let mut constraint = Constraint::new(Relation::LessEqual, 0.0);
            constraint.add_coefficient(x_appear, 1.0);
            for edge in graph.next_edges(*node) {
                constraint.add_coefficient(edges.get(edge)?, -1.0);
            }
            constraints.push(constraint);
        }
        Ok(constraints)
    }
}
