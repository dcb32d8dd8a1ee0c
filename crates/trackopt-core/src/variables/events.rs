//! Track event indicators: appear, disappear, split and merge.

use trackopt_expr::{Constraint, Relation};

use crate::Solver;
use crate::error::SolverError;
use crate::graph::{EdgeId, NodeId, TrackGraph};
use crate::variables::{EdgeSelected, NodeSelected, VariableKind, VariableMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    fn edges(self, graph: &TrackGraph, node: NodeId) -> &[EdgeId] {
        match self {
            Direction::Incoming => graph.prev_edges(node),
            Direction::Outgoing => graph.next_edges(node),
        }
    }
}

fn node_keys(graph: &TrackGraph) -> Vec<NodeId> {
    graph.node_ids().collect()
}

/// Start or end of a track.
///
/// With `n` edges in `direction` and `s = n * x_node - sum(x_edge)`:
/// `s - x_event <= n - 1` and `s - x_event >= 0`. Without such edges the
/// event indicator equals the node indicator.
fn endpoint_constraints<K: VariableKind<Key = NodeId>>(
    solver: &mut Solver,
    direction: Direction,
) -> Result<Vec<Constraint>, SolverError> {
    let events: VariableMap<K> = solver.get_variables::<K>()?;
    let nodes = solver.get_variables::<NodeSelected>()?;
    let edges = solver.get_variables::<EdgeSelected>()?;
    let graph = solver.graph();

    let mut constraints = Vec::with_capacity(2 * events.len());
    for (node, event) in events.iter() {
        let x_node = nodes.get(node)?;
        let incident = direction.edges(graph, *node);
        if incident.is_empty() {
            let mut equal = Constraint::new(Relation::Equal, 0.0);
            equal.add_coefficient(x_node, 1.0);
            equal.add_coefficient(event, -1.0);
            constraints.push(equal);
            continue;
        }

        let num_edges = incident.len() as f64;
        let mut upper = Constraint::new(Relation::LessEqual, num_edges - 1.0);
        let mut lower = Constraint::new(Relation::GreaterEqual, 0.0);
        for constraint in [&mut upper, &mut lower] {
            constraint.add_coefficient(x_node, num_edges);
            constraint.add_coefficient(event, -1.0);
            for edge in incident {
                constraint.add_coefficient(edges.get(edge)?, -1.0);
            }
        }
        constraints.push(upper);
        constraints.push(lower);
    }
    Ok(constraints)
}

/// More than one edge in `direction` is selected.
///
/// With `n` edges: `2 * x_event - sum(x_edge) <= 0` and
/// `(n - 1) * x_event - sum(x_edge) >= -1`.
fn branching_constraints<K: VariableKind<Key = NodeId>>(
    solver: &mut Solver,
    direction: Direction,
) -> Result<Vec<Constraint>, SolverError> {
    let events: VariableMap<K> = solver.get_variables::<K>()?;
    let edges = solver.get_variables::<EdgeSelected>()?;
    let graph = solver.graph();

    let mut constraints = Vec::with_capacity(2 * events.len());
    for (node, event) in events.iter() {
        let incident = direction.edges(graph, *node);
        let num_edges = incident.len() as f64;
        let mut upper = Constraint::new(Relation::LessEqual, 0.0);
        let mut lower = Constraint::new(Relation::GreaterEqual, -1.0);
        upper.add_coefficient(event, 2.0);
        lower.add_coefficient(event, num_edges - 1.0);
        for edge in incident {
            let x_edge = edges.get(edge)?;
            upper.add_coefficient(x_edge, -1.0);
            lower.add_coefficient(x_edge, -1.0);
        }
        constraints.push(upper);
        constraints.push(lower);
    }
    Ok(constraints)
}

/// 1 iff the node is selected and none of its incoming edges is.
#[derive(Debug)]
pub struct NodeAppear;

impl VariableKind for NodeAppear {
    const NAME: &'static str = "NodeAppear";
    type Key = NodeId;

    fn instantiate(graph: &TrackGraph) -> Vec<NodeId> {
        node_keys(graph)
    }

    fn instantiate_constraints(solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        endpoint_constraints::<Self>(solver, Direction::Incoming)
    }
}

/// 1 iff the node is selected and none of its outgoing edges is.
#[derive(Debug)]
pub struct NodeDisappear;

impl VariableKind for NodeDisappear {
    const NAME: &'static str = "NodeDisappear";
    type Key = NodeId;

    fn instantiate(graph: &TrackGraph) -> Vec<NodeId> {
        node_keys(graph)
    }

    fn instantiate_constraints(solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        endpoint_constraints::<Self>(solver, Direction::Outgoing)
    }
}

/// 1 iff more than one outgoing edge of the node is selected.
#[derive(Debug)]
pub struct NodeSplit;

impl VariableKind for NodeSplit {
    const NAME: &'static str = "NodeSplit";
    type Key = NodeId;

    fn instantiate(graph: &TrackGraph) -> Vec<NodeId> {
        node_keys(graph)
    }

    fn instantiate_constraints(solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        branching_constraints::<Self>(solver, Direction::Outgoing)
    }
}

/// 1 iff more than one incoming edge of the node is selected.
#[derive(Debug)]
pub struct NodeMerge;

impl VariableKind for NodeMerge {
    const NAME: &'static str = "NodeMerge";
    type Key = NodeId;

    fn instantiate(graph: &TrackGraph) -> Vec<NodeId> {
        node_keys(graph)
    }

    fn instantiate_constraints(solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        branching_constraints::<Self>(solver, Direction::Incoming)
    }
}
